//! The four collaborating stores
//!
//! Each persistence domain is owned by one store behind a narrow async trait.
//! Stores know nothing about each other: referential integrity between them
//! is the job of [`Storage`](crate::Storage), which is the only component
//! that should write through these traits.
//!
//! Implementations must be safe for concurrent access on distinct keys.
//! Deleting an absent key is a no-op, which is what makes cascades
//! idempotent under retry.

use async_trait::async_trait;

use crate::{
    Result, RuleId, ShareKey, UserKey, auth::AuthRule, settings::Settings, share::Share,
    user::User,
};

pub mod errors;
mod in_memory;

pub use errors::StoreError;
pub use in_memory::InMemory;

/// Persistence of user identity records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Retrieves a user by key, or `None` if absent.
    async fn get_user(&self, key: &UserKey) -> Result<Option<User>>;

    /// Inserts or replaces the user stored under `user.key`.
    async fn put_user(&self, user: User) -> Result<()>;

    /// Removes a user and durably retires its key.
    ///
    /// A retired key reports `true` from [`is_retired`](UserStore::is_retired)
    /// forever after, including across restarts of a persistent store.
    async fn delete_user(&self, key: &UserKey) -> Result<()>;

    /// Whether `key` belonged to a user that has since been deleted.
    async fn is_retired(&self, key: &UserKey) -> Result<bool>;

    /// All live users.
    async fn list_users(&self) -> Result<Vec<User>>;
}

/// Persistence of share-link records.
#[async_trait]
pub trait ShareStore: Send + Sync {
    async fn get_share(&self, key: &ShareKey) -> Result<Option<Share>>;

    async fn put_share(&self, share: Share) -> Result<()>;

    /// Removes a share. Absent keys are not an error.
    async fn delete_share(&self, key: &ShareKey) -> Result<()>;

    /// Every share whose owner is `owner`.
    async fn list_shares_by_owner(&self, owner: &UserKey) -> Result<Vec<Share>>;

    async fn list_shares(&self) -> Result<Vec<Share>>;
}

/// Persistence of authentication-method configuration.
#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn get_rule(&self, id: &RuleId) -> Result<Option<AuthRule>>;

    async fn put_rule(&self, rule: AuthRule) -> Result<()>;

    /// Removes a rule. Absent ids are not an error.
    async fn delete_rule(&self, id: &RuleId) -> Result<()>;

    /// Every rule whose subject is `user`.
    async fn list_rules_by_subject(&self, user: &UserKey) -> Result<Vec<AuthRule>>;

    async fn list_rules(&self) -> Result<Vec<AuthRule>>;
}

/// Persistence of the global settings singleton.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// The stored settings, or `None` if never written.
    async fn get_settings(&self) -> Result<Option<Settings>>;

    async fn put_settings(&self, settings: Settings) -> Result<()>;
}
