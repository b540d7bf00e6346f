//! In-memory store implementation
//!
//! One struct implementing all four store traits, suitable for tests,
//! development, and single-process deployments that persist by saving the
//! whole state to a JSON file.

mod persistence;

use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    Result, RuleId, ShareKey, UserKey,
    auth::AuthRule,
    settings::Settings,
    share::Share,
    store::{AuthStore, SettingsStore, ShareStore, UserStore},
    user::User,
};

/// A `HashMap`-backed store for every domain.
///
/// Each domain sits behind its own lock, so operations on different domains
/// never contend. Persistence is explicit via [`save_to_file`](InMemory::save_to_file)
/// and [`load_from_file`](InMemory::load_from_file); retired user keys are
/// saved alongside the records so they stay retired across restarts.
#[derive(Debug, Default)]
pub struct InMemory {
    pub(crate) users: RwLock<HashMap<UserKey, User>>,
    /// Keys of deleted users
    pub(crate) retired: RwLock<HashSet<UserKey>>,
    pub(crate) shares: RwLock<HashMap<ShareKey, Share>>,
    pub(crate) rules: RwLock<HashMap<RuleId, AuthRule>>,
    pub(crate) settings: RwLock<Option<Settings>>,
}

impl InMemory {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves every domain to `path` as JSON.
    ///
    /// The file is written next to its destination and renamed into place,
    /// so a crash mid-save leaves the previous file intact.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_to_file(self, path).await
    }

    /// Loads a store from a JSON file written by [`save_to_file`](InMemory::save_to_file).
    ///
    /// If the file does not exist, a new, empty store is returned.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        persistence::load_from_file(path).await
    }
}

fn sorted_by<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by_key(|item| key(item));
    items
}

#[async_trait]
impl UserStore for InMemory {
    async fn get_user(&self, key: &UserKey) -> Result<Option<User>> {
        Ok(self.users.read().await.get(key).cloned())
    }

    async fn put_user(&self, user: User) -> Result<()> {
        self.users.write().await.insert(user.key.clone(), user);
        Ok(())
    }

    async fn delete_user(&self, key: &UserKey) -> Result<()> {
        // users before retired, everywhere
        let mut users = self.users.write().await;
        if users.remove(key).is_some() {
            self.retired.write().await.insert(key.clone());
        }
        Ok(())
    }

    async fn is_retired(&self, key: &UserKey) -> Result<bool> {
        Ok(self.retired.read().await.contains(key))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let users = self.users.read().await.values().cloned().collect();
        Ok(sorted_by(users, |u: &User| u.key.clone()))
    }
}

#[async_trait]
impl ShareStore for InMemory {
    async fn get_share(&self, key: &ShareKey) -> Result<Option<Share>> {
        Ok(self.shares.read().await.get(key).cloned())
    }

    async fn put_share(&self, share: Share) -> Result<()> {
        self.shares.write().await.insert(share.key.clone(), share);
        Ok(())
    }

    async fn delete_share(&self, key: &ShareKey) -> Result<()> {
        self.shares.write().await.remove(key);
        Ok(())
    }

    async fn list_shares_by_owner(&self, owner: &UserKey) -> Result<Vec<Share>> {
        let shares = self
            .shares
            .read()
            .await
            .values()
            .filter(|s| &s.owner == owner)
            .cloned()
            .collect();
        Ok(sorted_by(shares, |s: &Share| s.key.clone()))
    }

    async fn list_shares(&self) -> Result<Vec<Share>> {
        let shares = self.shares.read().await.values().cloned().collect();
        Ok(sorted_by(shares, |s: &Share| s.key.clone()))
    }
}

#[async_trait]
impl AuthStore for InMemory {
    async fn get_rule(&self, id: &RuleId) -> Result<Option<AuthRule>> {
        Ok(self.rules.read().await.get(id).cloned())
    }

    async fn put_rule(&self, rule: AuthRule) -> Result<()> {
        self.rules.write().await.insert(rule.id.clone(), rule);
        Ok(())
    }

    async fn delete_rule(&self, id: &RuleId) -> Result<()> {
        self.rules.write().await.remove(id);
        Ok(())
    }

    async fn list_rules_by_subject(&self, user: &UserKey) -> Result<Vec<AuthRule>> {
        let rules = self
            .rules
            .read()
            .await
            .values()
            .filter(|r| r.references(user))
            .cloned()
            .collect();
        Ok(sorted_by(rules, |r: &AuthRule| r.id.clone()))
    }

    async fn list_rules(&self) -> Result<Vec<AuthRule>> {
        let rules = self.rules.read().await.values().cloned().collect();
        Ok(sorted_by(rules, |r: &AuthRule| r.id.clone()))
    }
}

#[async_trait]
impl SettingsStore for InMemory {
    async fn get_settings(&self) -> Result<Option<Settings>> {
        Ok(self.settings.read().await.clone())
    }

    async fn put_settings(&self, settings: Settings) -> Result<()> {
        *self.settings.write().await = Some(settings);
        Ok(())
    }
}
