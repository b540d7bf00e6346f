//! Per-key advisory locks
//!
//! Check-then-act sequences that span stores (validate an owner, then write a
//! share) are serialized per logical key rather than behind one global lock,
//! so unrelated keys never wait on each other.
//!
//! Lock order: a [`LockKey::User`] is always taken before any
//! [`LockKey::Share`] or [`LockKey::Rule`], and no operation holds two user
//! locks at once.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, Weak},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::{RuleId, ShareKey, UserKey};

/// A logical key that can be locked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum LockKey {
    User(UserKey),
    Share(ShareKey),
    Rule(RuleId),
}

type Slots = Arc<Mutex<HashMap<LockKey, Weak<AsyncMutex<()>>>>>;

/// Table of advisory locks, one slot per key currently in use.
///
/// Slots are held weakly: a slot lives exactly as long as some guard or
/// waiter holds it, and is pruned when the last one lets go.
#[derive(Debug, Clone, Default)]
pub(crate) struct KeyLocks {
    slots: Slots,
}

/// Holds one key's lock until dropped.
///
/// Dropping is the only way to release, so every exit path (success, error,
/// or a cancelled future) releases the key.
#[derive(Debug)]
pub(crate) struct KeyGuard {
    key: LockKey,
    guard: Option<OwnedMutexGuard<()>>,
    slots: Slots,
}

impl KeyLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub(crate) async fn lock(&self, key: LockKey) -> KeyGuard {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            match slots.get(&key).and_then(Weak::upgrade) {
                Some(slot) => slot,
                None => {
                    let slot = Arc::new(AsyncMutex::new(()));
                    slots.insert(key.clone(), Arc::downgrade(&slot));
                    slot
                }
            }
        };
        let guard = slot.lock_owned().await;
        KeyGuard {
            key,
            guard: Some(guard),
            slots: self.slots.clone(),
        }
    }

    /// Number of keys with a live slot.
    #[cfg(test)]
    pub(crate) fn active(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| slot.strong_count() > 0).count()
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // Release first so the slot's strong count reflects remaining waiters.
        self.guard.take();
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots
            .get(&self.key)
            .is_some_and(|slot| slot.strong_count() == 0)
        {
            slots.remove(&self.key);
        }
    }
}
