//!
//! filekeep: the persistence-coordination layer of a file-sharing backend.
//!
//! Four persistence domains (users, share links, authentication rules, and
//! global settings) live in independent stores. This library composes them
//! behind a single facade that keeps cross-domain references consistent.
//!
//! ## Core Concepts
//!
//! * **Records**: [`user::User`], [`share::Share`], [`auth::AuthRule`], and
//!   [`settings::Settings`], each addressed by its own key type.
//! * **Stores (`store`)**: narrow async traits ([`store::UserStore`],
//!   [`store::ShareStore`], [`store::AuthStore`], [`store::SettingsStore`])
//!   that each own one domain's storage. [`store::InMemory`] implements all
//!   four with JSON persistence.
//! * **Storage (`storage::Storage`)**: the consistency facade. Every write that
//!   can affect referential integrity across domains goes through it. It
//!   validates references, holds per-key advisory locks for check-then-act
//!   sequences, and runs deletes as ordered cascades (dependents before
//!   owner) that are safe to retry.
//! * **OpContext (`storage::OpContext`)**: a caller's deadline and
//!   cancellation signal, checked between the steps of every operation.

pub mod auth;
pub mod clock;
pub mod config;
pub mod keys;
pub mod settings;
pub mod share;
pub mod storage;
pub mod store;
pub mod user;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::StorageConfig;
pub use keys::{RuleId, ShareKey, UserKey};
pub use storage::{OpContext, Storage, StorageError, Stores};
pub use store::{InMemory, StoreError};

/// Result type used throughout the filekeep library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the filekeep library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured errors from the consistency facade
    #[error(transparent)]
    Storage(storage::StorageError),

    /// Structured errors from an underlying store
    #[error(transparent)]
    Store(store::StoreError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Storage(_) => "storage",
            Error::Store(_) => "store",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Storage(err) => err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates a conflict (key already taken or retired).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Storage(err) => err.is_duplicate_key(),
            _ => false,
        }
    }

    /// Check if this error was detected before any write happened.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Storage(err) => err.is_validation_error(),
            _ => false,
        }
    }

    /// Check if this error reports a reference to a missing user.
    pub fn is_dangling_reference(&self) -> bool {
        match self {
            Error::Storage(err) => err.is_dangling_reference(),
            _ => false,
        }
    }

    /// Check if this error reports a partially completed cascade.
    pub fn is_cascade_failure(&self) -> bool {
        match self {
            Error::Storage(err) => err.is_cascade_failure(),
            _ => false,
        }
    }

    /// Check if this error indicates the caller's deadline passed.
    pub fn is_timeout_error(&self) -> bool {
        match self {
            Error::Storage(err) => err.is_deadline_exceeded(),
            _ => false,
        }
    }

    /// Check if this error indicates the caller cancelled the operation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Storage(err) => err.is_cancelled(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Store(store_err) => store_err.is_io_error(),
            _ => false,
        }
    }

    /// Check if retrying the same call may succeed.
    ///
    /// Interrupted cascades converge on retry, and unavailable stores may
    /// come back.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Storage(err) => err.is_retryable(),
            Error::Store(store_err) => store_err.is_unavailable(),
            _ => false,
        }
    }
}
