//! Core data types for user accounts

use serde::{Deserialize, Serialize};

use crate::{
    Result, UserKey,
    keys::key_problem,
    storage::{Domain, StorageError},
};

/// A user identity record.
///
/// The `key` is the identity: it is unique, immutable once created, and
/// retired for good when the user is deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identity key
    pub key: UserKey,

    /// Login name
    pub username: String,

    /// Whether this record is a single person or a group
    #[serde(default)]
    pub scope: Scope,

    /// What the user may do with files
    #[serde(default)]
    pub permissions: Permissions,

    /// Root of the file tree visible to the user
    #[serde(default = "default_home")]
    pub home: String,

    /// Interface locale
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Creation timestamp (Unix seconds), stamped by the facade
    #[serde(default)]
    pub created_at: i64,
}

fn default_home() -> String {
    "/".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

/// Whether a user record stands for one person or a group of them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Individual,
    Group,
}

/// File permissions attached to a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    pub admin: bool,
    pub execute: bool,
    pub create: bool,
    pub rename: bool,
    pub modify: bool,
    pub delete: bool,
    pub share: bool,
    pub download: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            admin: false,
            execute: false,
            create: true,
            rename: true,
            modify: true,
            delete: true,
            share: true,
            download: true,
        }
    }
}

impl Permissions {
    /// Every permission granted.
    pub fn all() -> Self {
        Self {
            admin: true,
            execute: true,
            create: true,
            rename: true,
            modify: true,
            delete: true,
            share: true,
            download: true,
        }
    }
}

impl User {
    /// New individual user with a generated key and default permissions.
    pub fn new(username: impl Into<String>) -> Self {
        Self::with_key(UserKey::generate(), username)
    }

    /// New individual user with a caller-supplied key.
    pub fn with_key(key: impl Into<UserKey>, username: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            username: username.into(),
            scope: Scope::Individual,
            permissions: Permissions::default(),
            home: default_home(),
            locale: default_locale(),
            created_at: 0,
        }
    }

    /// Builder-style setter for the scope.
    pub fn scoped(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Builder-style setter for the permissions.
    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// Builder-style setter for the home directory.
    pub fn with_home(mut self, home: impl Into<String>) -> Self {
        self.home = home.into();
        self
    }

    pub fn is_group(&self) -> bool {
        self.scope == Scope::Group
    }

    /// Check that all required attributes are present and well formed.
    pub fn validate(&self) -> Result<()> {
        if let Some(reason) = key_problem(self.key.as_str()) {
            return Err(StorageError::invalid(Domain::User, reason).into());
        }
        if self.username.trim().is_empty() {
            return Err(StorageError::invalid(Domain::User, "username must not be empty").into());
        }
        if !self.home.starts_with('/') {
            return Err(StorageError::invalid(
                Domain::User,
                format!("home '{}' must be an absolute path", self.home),
            )
            .into());
        }
        Ok(())
    }
}
