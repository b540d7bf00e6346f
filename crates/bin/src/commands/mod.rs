//! One module per subcommand group.

pub mod auth;
pub mod check;
pub mod init;
pub mod settings;
pub mod share;
pub mod user;
