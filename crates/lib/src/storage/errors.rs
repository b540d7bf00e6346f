//! Error types for the consistency facade.
//!
//! Validation failures (`NotFound`, `DuplicateKey`, `InvalidRecord`,
//! `DanglingReference`) are detected before any write and carry no side
//! effects. `CascadeFailed`, `DeadlineExceeded`, and `Cancelled` may leave a
//! delete partially applied; all three are safe to resolve by retrying the
//! same call.

use std::fmt;

use thiserror::Error;

use crate::{RuleId, ShareKey, UserKey};

/// The persistence domain a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    User,
    Share,
    AuthRule,
    Settings,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Domain::User => "user",
            Domain::Share => "share",
            Domain::AuthRule => "auth rule",
            Domain::Settings => "settings",
        })
    }
}

fn key_state(retired: &bool) -> &'static str {
    if *retired { "retired" } else { "exists" }
}

/// One step of a user-deletion cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeStep {
    ListShares,
    DeleteShare(ShareKey),
    ListRules,
    ClearRule(RuleId),
    DeleteUser,
}

impl fmt::Display for CascadeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CascadeStep::ListShares => f.write_str("list owned shares"),
            CascadeStep::DeleteShare(key) => write!(f, "delete share {key}"),
            CascadeStep::ListRules => f.write_str("list referencing auth rules"),
            CascadeStep::ClearRule(id) => write!(f, "clear auth rule {id}"),
            CascadeStep::DeleteUser => f.write_str("delete user record"),
        }
    }
}

/// Errors reported by [`Storage`](crate::Storage) operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StorageError {
    /// The addressed record does not exist.
    #[error("{domain} not found: {key}")]
    NotFound { domain: Domain, key: String },

    /// The key is already occupied, or belonged to a deleted user.
    #[error("{domain} key already {}: {key}", key_state(.retired))]
    DuplicateKey {
        domain: Domain,
        key: String,
        /// The key belonged to a user that was deleted and may not be reused
        retired: bool,
    },

    /// Required attributes are absent or malformed.
    #[error("invalid {domain} record: {reason}")]
    InvalidRecord { domain: Domain, reason: String },

    /// The record refers to a user that does not exist.
    #[error("{domain} {key} references missing user {user}")]
    DanglingReference {
        domain: Domain,
        key: String,
        user: UserKey,
    },

    /// A user-deletion cascade stopped after some of its steps had been applied.
    ///
    /// The user record itself is untouched. Retrying the same delete resumes
    /// from the remaining dependents.
    #[error("deleting user {user} failed at step '{step}' after {completed} completed step(s)")]
    CascadeFailed {
        user: UserKey,
        step: CascadeStep,
        completed: usize,
        #[source]
        source: Box<crate::Error>,
    },

    /// The caller's deadline passed before the operation finished.
    #[error("{operation} exceeded its deadline after {completed} completed step(s)")]
    DeadlineExceeded {
        operation: &'static str,
        completed: usize,
    },

    /// The caller cancelled the operation.
    #[error("{operation} cancelled after {completed} completed step(s)")]
    Cancelled {
        operation: &'static str,
        completed: usize,
    },
}

impl StorageError {
    pub(crate) fn not_found(domain: Domain, key: impl fmt::Display) -> Self {
        StorageError::NotFound {
            domain,
            key: key.to_string(),
        }
    }

    pub(crate) fn duplicate(domain: Domain, key: impl fmt::Display) -> Self {
        StorageError::DuplicateKey {
            domain,
            key: key.to_string(),
            retired: false,
        }
    }

    pub(crate) fn retired(key: &UserKey) -> Self {
        StorageError::DuplicateKey {
            domain: Domain::User,
            key: key.to_string(),
            retired: true,
        }
    }

    pub(crate) fn invalid(domain: Domain, reason: impl Into<String>) -> Self {
        StorageError::InvalidRecord {
            domain,
            reason: reason.into(),
        }
    }

    pub(crate) fn dangling(domain: Domain, key: impl fmt::Display, user: &UserKey) -> Self {
        StorageError::DanglingReference {
            domain,
            key: key.to_string(),
            user: user.clone(),
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }

    /// Check if this error indicates the key is taken or retired.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StorageError::DuplicateKey { .. })
    }

    /// Check if this error was detected before any write, with no side effects.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            StorageError::NotFound { .. }
                | StorageError::DuplicateKey { .. }
                | StorageError::InvalidRecord { .. }
                | StorageError::DanglingReference { .. }
        )
    }

    pub fn is_dangling_reference(&self) -> bool {
        matches!(self, StorageError::DanglingReference { .. })
    }

    pub fn is_cascade_failure(&self) -> bool {
        matches!(self, StorageError::CascadeFailed { .. })
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, StorageError::DeadlineExceeded { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, StorageError::Cancelled { .. })
    }

    /// Check if retrying the same call converges.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StorageError::CascadeFailed { .. }
                | StorageError::DeadlineExceeded { .. }
                | StorageError::Cancelled { .. }
        )
    }

    /// Get the domain this error is about, if any.
    pub fn domain(&self) -> Option<Domain> {
        match self {
            StorageError::NotFound { domain, .. }
            | StorageError::DuplicateKey { domain, .. }
            | StorageError::InvalidRecord { domain, .. }
            | StorageError::DanglingReference { domain, .. } => Some(*domain),
            StorageError::CascadeFailed { .. } => Some(Domain::User),
            _ => None,
        }
    }

    /// Get the cascade step that failed, for operator reconciliation.
    pub fn cascade_step(&self) -> Option<&CascadeStep> {
        match self {
            StorageError::CascadeFailed { step, .. } => Some(step),
            _ => None,
        }
    }

    /// Number of steps applied before the operation stopped.
    pub fn completed_steps(&self) -> usize {
        match self {
            StorageError::CascadeFailed { completed, .. }
            | StorageError::DeadlineExceeded { completed, .. }
            | StorageError::Cancelled { completed, .. } => *completed,
            _ => 0,
        }
    }
}

impl From<StorageError> for crate::Error {
    fn from(err: StorageError) -> Self {
        crate::Error::Storage(err)
    }
}
