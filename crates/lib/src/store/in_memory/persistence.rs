//! Persistence operations for the InMemory store
//!
//! Serializes every domain, plus the set of retired user keys, to a single
//! versioned JSON document.

use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::InMemory;
use crate::{
    Error, Result, RuleId, ShareKey, UserKey, auth::AuthRule, settings::Settings, share::Share,
    store::errors::StoreError, user::User,
};

/// The current persistence file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

fn is_v0(v: &u8) -> bool {
    *v == 0
}

#[derive(Serialize, Deserialize)]
struct SerializableStore {
    #[serde(rename = "_v", default, skip_serializing_if = "is_v0")]
    version: u8,
    #[serde(default)]
    users: HashMap<UserKey, User>,
    #[serde(default)]
    retired_users: HashSet<UserKey>,
    #[serde(default)]
    shares: HashMap<ShareKey, Share>,
    #[serde(default)]
    rules: HashMap<RuleId, AuthRule>,
    #[serde(default)]
    settings: Option<Settings>,
}

pub(crate) async fn save_to_file<P: AsRef<Path>>(store: &InMemory, path: P) -> Result<()> {
    let path = path.as_ref();

    // Same lock order as UserStore::delete_user
    let snapshot = {
        let users = store.users.read().await;
        let retired = store.retired.read().await;
        SerializableStore {
            version: PERSISTENCE_VERSION,
            users: users.clone(),
            retired_users: retired.clone(),
            shares: store.shares.read().await.clone(),
            rules: store.rules.read().await.clone(),
            settings: store.settings.read().await.clone(),
        }
    };

    let json = serde_json::to_string_pretty(&snapshot)
        .map_err(|e| -> Error { StoreError::SerializationFailed { source: e }.into() })?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    tokio::fs::write(&tmp, json)
        .await
        .map_err(|e| -> Error { StoreError::FileIo { source: e }.into() })?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| -> Error { StoreError::FileIo { source: e }.into() })
}

pub(crate) async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<InMemory> {
    let json = match tokio::fs::read_to_string(path).await {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(InMemory::new()),
        Err(e) => return Err(StoreError::FileIo { source: e }.into()),
    };

    let stored: SerializableStore = serde_json::from_str(&json)
        .map_err(|e| -> Error { StoreError::DeserializationFailed { source: e }.into() })?;
    if stored.version != PERSISTENCE_VERSION {
        return Err(StoreError::UnsupportedVersion {
            version: stored.version,
        }
        .into());
    }

    Ok(InMemory {
        users: RwLock::new(stored.users),
        retired: RwLock::new(stored.retired_users),
        shares: RwLock::new(stored.shares),
        rules: RwLock::new(stored.rules),
        settings: RwLock::new(stored.settings),
    })
}
