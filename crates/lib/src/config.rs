//! Facade configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Tunables for [`Storage`](crate::Storage).
///
/// ```
/// use std::time::Duration;
/// use filekeep::StorageConfig;
///
/// let config = StorageConfig::default().with_default_timeout(Duration::from_secs(2));
/// assert_eq!(config.default_timeout(), Some(Duration::from_secs(2)));
/// assert!(config.purge_expired_shares);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Deadline applied to operations whose context carries none, in milliseconds.
    pub default_timeout_ms: Option<u64>,

    /// Delete expired shares when a read observes them.
    pub purge_expired_shares: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: None,
            purge_expired_shares: true,
        }
    }
}

impl StorageConfig {
    /// Set the fallback deadline for contexts without one.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Fallback deadline as a [`Duration`].
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_ms.map(Duration::from_millis)
    }

    /// Load a configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}
