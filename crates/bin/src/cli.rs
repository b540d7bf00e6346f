//! CLI argument definitions for the filekeep binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// filekeep storage administration
#[derive(Parser, Debug)]
#[command(name = "filekeep")]
#[command(about = "filekeep: administer users, share links, and auth rules")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand
#[derive(clap::Args, Debug)]
pub struct GlobalArgs {
    /// Data directory holding filekeep.json
    #[arg(short = 'D', long, global = true, env = "FILEKEEP_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Storage configuration file (JSON)
    #[arg(short, long, global = true, env = "FILEKEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Deadline for the operation, in milliseconds
    #[arg(long, global = true, env = "FILEKEEP_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and an empty store with default settings
    Init,
    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
    /// Manage share links
    Share {
        #[command(subcommand)]
        command: ShareCommand,
    },
    /// Manage authentication rules
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
    /// Show or replace global settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// Look for shares and rules that reference missing users
    Check(CheckArgs),
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Create a user
    Create(UserCreateArgs),
    /// Delete a user with its shares; rules naming it become global
    Delete { key: String },
    /// List users
    List,
    /// Show one user
    Show { key: String },
}

#[derive(clap::Args, Debug)]
pub struct UserCreateArgs {
    pub username: String,

    /// User key (generated if omitted)
    #[arg(long)]
    pub key: Option<String>,

    /// Home directory inside the file tree
    #[arg(long)]
    pub home: Option<String>,

    /// Create a group rather than an individual
    #[arg(long)]
    pub group: bool,

    /// Grant administrator permissions
    #[arg(long)]
    pub admin: bool,
}

#[derive(Subcommand, Debug)]
pub enum ShareCommand {
    /// Share a path of a user's tree
    Create(ShareCreateArgs),
    /// Delete a share link
    Delete { key: String },
    /// List live share links
    List {
        /// Only shares owned by this user
        #[arg(long)]
        owner: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
pub struct ShareCreateArgs {
    pub owner: String,
    pub path: String,

    /// Share key (generated if omitted)
    #[arg(long)]
    pub key: Option<String>,

    /// Require authentication to open the link
    #[arg(long)]
    pub private: bool,

    /// Expire the link after this many seconds
    #[arg(long)]
    pub expires_in: Option<u64>,
}

/// Authentication method kinds
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Method {
    Json,
    Proxy,
    Hook,
    Noauth,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Create or replace an auth rule
    Set(AuthSetArgs),
    /// Delete an auth rule
    Delete { id: String },
    /// List auth rules
    List,
}

#[derive(clap::Args, Debug)]
pub struct AuthSetArgs {
    pub id: String,
    pub method: Method,

    /// Header carrying the user name (proxy)
    #[arg(long, required_if_eq("method", "proxy"))]
    pub header: Option<String>,

    /// Command that checks credentials (hook)
    #[arg(long, required_if_eq("method", "hook"))]
    pub command: Option<String>,

    /// User or group the rule applies to (global if omitted)
    #[arg(long)]
    pub subject: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Print the current settings
    Show,
    /// Replace the settings with the contents of a JSON file
    Set { file: PathBuf },
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Delete dangling shares and clear dangling rule subjects
    #[arg(long)]
    pub repair: bool,
}
