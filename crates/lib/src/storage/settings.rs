//! Settings operations
//!
//! Settings reference nothing else, so these never take a lock or read
//! another domain.

use tracing::info;

use super::{
    OpContext, Storage,
    context::Steps,
    errors::{Domain, StorageError},
};
use crate::{Result, settings::Settings};

impl Storage {
    /// The stored settings. `NotFound` until settings are written once.
    pub async fn get_settings(&self, ctx: &OpContext) -> Result<Settings> {
        let ctx = self.effective(ctx);
        Steps::new(&ctx, "get_settings").check()?;
        self.stores()
            .settings
            .get_settings()
            .await?
            .ok_or_else(|| StorageError::not_found(Domain::Settings, "global").into())
    }

    /// Replace the settings after checking them for internal consistency.
    pub async fn put_settings(&self, ctx: &OpContext, settings: Settings) -> Result<()> {
        settings.validate()?;

        let ctx = self.effective(ctx);
        Steps::new(&ctx, "put_settings").check()?;
        self.stores().settings.put_settings(settings).await?;
        info!("Stored settings");
        Ok(())
    }
}
