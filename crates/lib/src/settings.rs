//! Global settings
//!
//! A singleton record with no references into the other domains. Reads and
//! writes never consult user, share, or rule state.

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    storage::{Domain, StorageError},
    user::{Permissions, Scope},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Allow visitors to create their own accounts
    pub signup: bool,

    /// Create a home directory for each new user
    pub create_user_dir: bool,

    /// Parent of the per-user home directories
    pub user_home_base_path: String,

    pub min_password_length: u32,

    pub branding: Branding,

    /// Attributes given to newly created users
    pub defaults: UserDefaults,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Branding {
    pub name: String,
    pub disable_external: bool,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            name: "filekeep".to_string(),
            disable_external: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDefaults {
    pub scope: Scope,
    pub locale: String,
    pub permissions: Permissions,
}

impl Default for UserDefaults {
    fn default() -> Self {
        Self {
            scope: Scope::Individual,
            locale: "en".to_string(),
            permissions: Permissions::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            signup: false,
            create_user_dir: false,
            user_home_base_path: "/users".to_string(),
            min_password_length: 12,
            branding: Branding::default(),
            defaults: UserDefaults::default(),
        }
    }
}

impl Settings {
    /// Self-consistency check. Never looks at other domains.
    pub fn validate(&self) -> Result<()> {
        if self.min_password_length == 0 {
            return Err(StorageError::invalid(
                Domain::Settings,
                "min_password_length must be at least 1",
            )
            .into());
        }
        if self.create_user_dir && self.user_home_base_path.trim().is_empty() {
            return Err(StorageError::invalid(
                Domain::Settings,
                "user_home_base_path is required when create_user_dir is set",
            )
            .into());
        }
        Ok(())
    }
}
