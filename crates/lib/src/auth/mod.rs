//! Authentication configuration
//!
//! Authentication rules map a login method to an optional user or group.
//! A rule without a subject applies globally. When its subject is deleted,
//! a rule is degraded to global rather than removed, since it may encode
//! policy that outlives the specific user.

pub mod types;

pub use types::{AuthMethod, AuthRule};
