//! Share links
//!
//! A share publishes one path of its owner's file tree under a share key.
//! The owner reference must resolve to a live user for as long as the share
//! exists; deleting the owner deletes its shares first.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    Result, ShareKey, UserKey,
    keys::key_problem,
    storage::{Domain, StorageError},
};

/// A share-link record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub key: ShareKey,

    /// Owning user. Must resolve to an existing user.
    pub owner: UserKey,

    /// Shared path inside the owner's tree
    pub path: String,

    #[serde(default)]
    pub visibility: Visibility,

    /// Expiry timestamp (Unix seconds). `None` never expires.
    #[serde(default)]
    pub expires_at: Option<i64>,

    /// Creation timestamp (Unix seconds), stamped by the facade
    #[serde(default)]
    pub created_at: i64,
}

/// Who may open a share link.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Anyone holding the link
    #[default]
    Public,
    /// Only authenticated users
    Private,
}

impl Share {
    /// New public, non-expiring share with a generated key.
    pub fn new(owner: impl Into<UserKey>, path: impl Into<String>) -> Self {
        Self::with_key(ShareKey::generate(), owner, path)
    }

    /// New public, non-expiring share with a caller-supplied key.
    pub fn with_key(
        key: impl Into<ShareKey>,
        owner: impl Into<UserKey>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            owner: owner.into(),
            path: path.into(),
            visibility: Visibility::Public,
            expires_at: None,
            created_at: 0,
        }
    }

    /// Builder-style setter for the visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Builder-style setter for an absolute expiry timestamp.
    pub fn expiring_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set the expiry relative to `now_secs`.
    ///
    /// Fails with `InvalidRecord` when the expiry does not fit a timestamp.
    pub fn expiring_in(self, now_secs: i64, ttl: Duration) -> Result<Self> {
        let expires_at = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|secs| now_secs.checked_add(secs))
            .ok_or_else(|| {
                StorageError::invalid(
                    Domain::Share,
                    format!("expiry of {}s is out of range", ttl.as_secs()),
                )
            })?;
        Ok(self.expiring_at(expires_at))
    }

    /// True once `now_secs` has reached the expiry timestamp.
    pub fn is_expired(&self, now_secs: i64) -> bool {
        self.expires_at.is_some_and(|at| at <= now_secs)
    }

    /// Check that all required attributes are present and well formed.
    ///
    /// `now_secs` rejects shares that would already be expired on creation.
    pub fn validate(&self, now_secs: i64) -> Result<()> {
        if let Some(reason) = key_problem(self.key.as_str()) {
            return Err(StorageError::invalid(Domain::Share, reason).into());
        }
        if self.owner.is_empty() {
            return Err(StorageError::invalid(Domain::Share, "owner must not be empty").into());
        }
        if !self.path.starts_with('/') {
            return Err(StorageError::invalid(
                Domain::Share,
                format!("path '{}' must be absolute", self.path),
            )
            .into());
        }
        if self.is_expired(now_secs) {
            return Err(StorageError::invalid(Domain::Share, "share is already expired").into());
        }
        Ok(())
    }
}
