//! The consistency facade
//!
//! [`Storage`] composes the four stores behind a single entry point. Every
//! write that can affect referential integrity across domains is routed
//! through it:
//!
//! - a share's owner and an auth rule's subject must resolve to a live user
//!   when written,
//! - deleting a user first deletes the user's shares, then degrades every
//!   rule that names the user to a global rule, and removes the user record
//!   last,
//! - deleted user keys are retired and never reused.
//!
//! Check-then-act sequences hold per-key advisory locks (see [`locks`]) so
//! that, for example, a share cannot be created for a user whose deletion is
//! in flight. Unrelated keys never wait on each other.
//!
//! There is no cross-store transaction. Deletes run as a fixed sequence of
//! steps ordered so that an interruption leaves orphaned-but-harmless state
//! (a user with fewer dependents) rather than a dangling reference, and
//! rerunning the same delete converges.

use std::sync::Arc;

use handle_trait::Handle;

use crate::{
    Clock, InMemory, StorageConfig, SystemClock,
    store::{AuthStore, SettingsStore, ShareStore, UserStore},
};

mod auth;
mod context;
pub mod errors;
mod integrity;
mod locks;
mod settings;
mod shares;
mod users;

pub use context::OpContext;
pub use errors::{CascadeStep, Domain, StorageError};
pub use integrity::IntegrityReport;

use locks::KeyLocks;

/// The four stores the facade coordinates.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub shares: Arc<dyn ShareStore>,
    pub auth: Arc<dyn AuthStore>,
    pub settings: Arc<dyn SettingsStore>,
}

impl Stores {
    /// Use one value implementing every store trait for all four domains.
    pub fn shared<T>(store: Arc<T>) -> Self
    where
        T: UserStore + ShareStore + AuthStore + SettingsStore + 'static,
    {
        Self {
            users: store.clone(),
            shares: store.clone(),
            auth: store.clone(),
            settings: store,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores")
            .field("users", &"<UserStore>")
            .field("shares", &"<ShareStore>")
            .field("auth", &"<AuthStore>")
            .field("settings", &"<SettingsStore>")
            .finish()
    }
}

#[derive(Debug)]
struct StorageInternal {
    stores: Stores,
    locks: KeyLocks,
    clock: Arc<dyn Clock>,
    config: StorageConfig,
}

/// Cross-domain consistency facade.
///
/// A cheap-to-clone handle; clones share the same stores and lock table.
/// The facade keeps no other mutable state of its own.
///
/// ## Example
///
/// ```
/// # use std::sync::Arc;
/// # use filekeep::{InMemory, OpContext, Storage, share::Share, user::User};
/// # #[tokio::main]
/// # async fn main() -> filekeep::Result<()> {
/// let storage = Storage::in_memory(Arc::new(InMemory::new()));
/// let ctx = OpContext::new();
///
/// let alice = storage.create_user(&ctx, User::with_key("u1", "alice")).await?;
/// let share = storage.create_share(&ctx, Share::with_key("s1", alice.clone(), "/docs")).await?;
///
/// storage.delete_user(&ctx, &alice).await?;
/// assert!(storage.get_share(&ctx, &share).await.unwrap_err().is_not_found());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Handle)]
pub struct Storage {
    inner: Arc<StorageInternal>,
}

impl Storage {
    /// Facade over `stores` with the default configuration.
    pub fn new(stores: Stores) -> Self {
        Self::open(stores, StorageConfig::default())
    }

    /// Facade over a single in-memory store serving all four domains.
    pub fn in_memory(store: Arc<InMemory>) -> Self {
        Self::new(Stores::shared(store))
    }

    /// Facade over `stores` with an explicit configuration.
    pub fn open(stores: Stores, config: StorageConfig) -> Self {
        Self::open_with_clock(stores, config, Arc::new(SystemClock))
    }

    /// Same as [`Storage::open`] with an injected time source.
    pub fn open_with_clock(stores: Stores, config: StorageConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(StorageInternal {
                stores,
                locks: KeyLocks::new(),
                clock,
                config,
            }),
        }
    }

    /// Current time in Unix seconds, from the facade's clock.
    pub fn now_secs(&self) -> i64 {
        self.inner.clock.now_secs()
    }

    pub(crate) fn stores(&self) -> &Stores {
        &self.inner.stores
    }

    pub(crate) fn config(&self) -> &StorageConfig {
        &self.inner.config
    }

    fn locks(&self) -> &KeyLocks {
        &self.inner.locks
    }

    /// The caller's context, with the configured fallback deadline if it has none.
    fn effective(&self, ctx: &OpContext) -> OpContext {
        ctx.or_timeout(self.inner.config.default_timeout())
    }
}
