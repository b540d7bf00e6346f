//! Key types addressing records in each persistence domain.
//!
//! Keys are opaque strings. They are either supplied by the caller or
//! generated from a random UUID.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest accepted key, in bytes.
pub const MAX_KEY_LEN: usize = 128;

macro_rules! record_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a key from any string-like input.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Generates a fresh random key.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().simple().to_string())
            }

            /// Returns the key as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the key is empty.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<$name> for String {
            fn from(key: $name) -> Self {
                key.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

record_key!(
    /// Identity key of a user. Immutable once created and never reused after deletion.
    UserKey
);

record_key!(
    /// Key of a share link, unique within the share store.
    ShareKey
);

record_key!(
    /// Identifier of an authentication rule.
    RuleId
);

/// Checks the shape shared by every record key.
///
/// Returns the reason the key is unusable, if any.
pub(crate) fn key_problem(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("key must not be empty".to_string());
    }
    if key.len() > MAX_KEY_LEN {
        return Some(format!(
            "key is {} bytes, longer than the {MAX_KEY_LEN} byte limit",
            key.len()
        ));
    }
    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Some("key must not contain whitespace or control characters".to_string());
    }
    None
}
