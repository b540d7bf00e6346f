//! Data directory bootstrap.

use filekeep::settings::Settings;

use crate::backend::{Backend, data_dir};
use crate::cli::GlobalArgs;

/// Run the `init` command
pub async fn run(global: &GlobalArgs) -> Result<(), Box<dyn std::error::Error>> {
    let dir = data_dir(global);
    tokio::fs::create_dir_all(&dir).await?;

    let backend = Backend::open(global).await?;
    let ctx = backend.context();
    match backend.storage.get_settings(&ctx).await {
        Ok(_) => println!("Already initialized in {}", dir.display()),
        Err(e) if e.is_not_found() => {
            backend.storage.put_settings(&ctx, Settings::default()).await?;
            backend.save().await?;
            tracing::info!("Initialized store in {}", dir.display());
            println!("Initialized filekeep in {}", dir.display());
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
