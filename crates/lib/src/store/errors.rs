//! Error types for store implementations.

use thiserror::Error;

/// Errors that can occur inside a store.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot serve requests right now.
    #[error("{store} store unavailable: {reason}")]
    Unavailable {
        /// Which store failed
        store: String,
        /// Description of the failure
        reason: String,
    },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        #[source]
        source: std::io::Error,
    },

    /// Persisted data was written by an unknown format version.
    #[error("Unsupported persistence version {version}")]
    UnsupportedVersion { version: u8 },
}

impl StoreError {
    /// Shorthand for an [`Unavailable`](StoreError::Unavailable) error.
    pub fn unavailable(store: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::Unavailable {
            store: store.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error is transient.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. })
    }

    /// Check if this error is related to I/O operations.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            StoreError::FileIo { .. }
                | StoreError::SerializationFailed { .. }
                | StoreError::DeserializationFailed { .. }
                | StoreError::UnsupportedVersion { .. }
        )
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
