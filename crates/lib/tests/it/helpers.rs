//! Shared setup for the integration tests
//!
//! [`FlakyStore`] wraps an [`InMemory`] store and can be told to fail or
//! stall individual store calls, which is how cascade interruption and
//! lock contention are exercised.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use filekeep::{
    FixedClock, InMemory, OpContext, Result, RuleId, ShareKey, Storage, StorageConfig, StoreError,
    Stores, UserKey,
    auth::{AuthMethod, AuthRule},
    settings::Settings,
    share::Share,
    store::{AuthStore, SettingsStore, ShareStore, UserStore},
    user::User,
};

// ===== STORAGE SETUP HELPERS =====

/// Facade over a fresh in-memory store.
pub fn setup_storage() -> (Storage, Arc<InMemory>) {
    let store = Arc::new(InMemory::new());
    (Storage::in_memory(store.clone()), store)
}

/// Facade over a fresh in-memory store with a manually driven clock.
pub fn setup_storage_with_clock() -> (Storage, Arc<FixedClock>) {
    let store = Arc::new(InMemory::new());
    let clock = Arc::new(FixedClock::default());
    let storage = Storage::open_with_clock(
        Stores::shared(store),
        StorageConfig::default(),
        clock.clone(),
    );
    (storage, clock)
}

/// Facade over a [`FlakyStore`].
pub fn setup_flaky_storage() -> (Storage, Arc<FlakyStore>) {
    let store = Arc::new(FlakyStore::new());
    (Storage::new(Stores::shared(store.clone())), store)
}

// ===== RECORD HELPERS =====

pub async fn create_user(storage: &Storage, key: &str) -> UserKey {
    storage
        .create_user(&OpContext::new(), User::with_key(key, key))
        .await
        .expect("Failed to create user")
}

pub async fn create_share(storage: &Storage, key: &str, owner: &str) -> ShareKey {
    storage
        .create_share(
            &OpContext::new(),
            Share::with_key(key, owner, format!("/{key}")),
        )
        .await
        .expect("Failed to create share")
}

pub async fn create_rule(storage: &Storage, id: &str, subject: Option<&str>) -> RuleId {
    let mut rule = AuthRule::new(id, AuthMethod::Json);
    if let Some(subject) = subject {
        rule = rule.for_subject(subject);
    }
    storage
        .upsert_auth_rule(&OpContext::new(), rule)
        .await
        .expect("Failed to store auth rule");
    RuleId::from(id)
}

/// A user owning `shares` shares and named by `rules` auth rules.
pub async fn user_with_dependents(
    storage: &Storage,
    key: &str,
    shares: usize,
    rules: usize,
) -> UserKey {
    let user = create_user(storage, key).await;
    for i in 0..shares {
        create_share(storage, &format!("{key}-s{i}"), key).await;
    }
    for i in 0..rules {
        create_rule(storage, &format!("{key}-r{i}"), Some(key)).await;
    }
    user
}

// ===== FAULT INJECTION =====

/// Store calls that [`FlakyStore`] can fail or stall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    GetUser,
    DeleteUser,
    DeleteShare,
    ListSharesByOwner,
    ListRulesBySubject,
    PutRule,
}

/// An [`InMemory`] store with injectable failures and delays.
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: InMemory,
    failing: Mutex<HashSet<Op>>,
    /// Fail only after this many successful calls of the op
    fail_after: Mutex<HashMap<Op, usize>>,
    delays: Mutex<HashMap<Op, Duration>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of `op` fail until [`heal`](Self::heal).
    pub fn fail(&self, op: Op) {
        self.failing.lock().unwrap().insert(op);
    }

    /// Let `calls` calls of `op` succeed, then fail the rest.
    pub fn fail_after(&self, op: Op, calls: usize) {
        self.fail_after.lock().unwrap().insert(op, calls);
        self.fail(op);
    }

    pub fn heal(&self, op: Op) {
        self.failing.lock().unwrap().remove(&op);
        self.fail_after.lock().unwrap().remove(&op);
    }

    /// Sleep before every call of `op`.
    pub fn delay(&self, op: Op, delay: Duration) {
        self.delays.lock().unwrap().insert(op, delay);
    }

    async fn enter(&self, op: Op) -> Result<()> {
        let delay = self.delays.lock().unwrap().get(&op).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if !self.failing.lock().unwrap().contains(&op) {
            return Ok(());
        }
        let mut budget = self.fail_after.lock().unwrap();
        match budget.get_mut(&op) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Ok(())
            }
            _ => Err(StoreError::unavailable("flaky", format!("{op:?} failed")).into()),
        }
    }
}

#[async_trait]
impl UserStore for FlakyStore {
    async fn get_user(&self, key: &UserKey) -> Result<Option<User>> {
        self.enter(Op::GetUser).await?;
        UserStore::get_user(&self.inner, key).await
    }

    async fn put_user(&self, user: User) -> Result<()> {
        self.inner.put_user(user).await
    }

    async fn delete_user(&self, key: &UserKey) -> Result<()> {
        self.enter(Op::DeleteUser).await?;
        UserStore::delete_user(&self.inner, key).await
    }

    async fn is_retired(&self, key: &UserKey) -> Result<bool> {
        self.inner.is_retired(key).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.inner.list_users().await
    }
}

#[async_trait]
impl ShareStore for FlakyStore {
    async fn get_share(&self, key: &ShareKey) -> Result<Option<Share>> {
        self.inner.get_share(key).await
    }

    async fn put_share(&self, share: Share) -> Result<()> {
        self.inner.put_share(share).await
    }

    async fn delete_share(&self, key: &ShareKey) -> Result<()> {
        self.enter(Op::DeleteShare).await?;
        self.inner.delete_share(key).await
    }

    async fn list_shares_by_owner(&self, owner: &UserKey) -> Result<Vec<Share>> {
        self.enter(Op::ListSharesByOwner).await?;
        self.inner.list_shares_by_owner(owner).await
    }

    async fn list_shares(&self) -> Result<Vec<Share>> {
        self.inner.list_shares().await
    }
}

#[async_trait]
impl AuthStore for FlakyStore {
    async fn get_rule(&self, id: &RuleId) -> Result<Option<AuthRule>> {
        self.inner.get_rule(id).await
    }

    async fn put_rule(&self, rule: AuthRule) -> Result<()> {
        self.enter(Op::PutRule).await?;
        self.inner.put_rule(rule).await
    }

    async fn delete_rule(&self, id: &RuleId) -> Result<()> {
        self.inner.delete_rule(id).await
    }

    async fn list_rules_by_subject(&self, user: &UserKey) -> Result<Vec<AuthRule>> {
        self.enter(Op::ListRulesBySubject).await?;
        self.inner.list_rules_by_subject(user).await
    }

    async fn list_rules(&self) -> Result<Vec<AuthRule>> {
        self.inner.list_rules().await
    }
}

#[async_trait]
impl SettingsStore for FlakyStore {
    async fn get_settings(&self) -> Result<Option<Settings>> {
        self.inner.get_settings().await
    }

    async fn put_settings(&self, settings: Settings) -> Result<()> {
        self.inner.put_settings(settings).await
    }
}
