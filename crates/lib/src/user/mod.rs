//! User accounts
//!
//! A user is the owning side of every cross-domain reference: shares are
//! owned by a user and authentication rules may target one. Users that act as
//! groups carry [`Scope::Group`] and are referenced the same way.

pub mod types;

pub use types::*;
