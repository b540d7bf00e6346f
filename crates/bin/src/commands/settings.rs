//! Settings commands.

use filekeep::settings::Settings;

use crate::backend::Backend;
use crate::cli::SettingsCommand;
use crate::output::{OutputFormat, print_fields, print_json};

pub async fn run(
    backend: &Backend,
    command: &SettingsCommand,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        SettingsCommand::Show => {
            let settings = backend.storage.get_settings(&backend.context()).await?;
            match format {
                OutputFormat::Human => print_fields(&[
                    ("Signup", settings.signup.to_string()),
                    ("Create user dir", settings.create_user_dir.to_string()),
                    ("User home base", settings.user_home_base_path.clone()),
                    ("Min password", settings.min_password_length.to_string()),
                    ("Branding", settings.branding.name.clone()),
                    ("Default locale", settings.defaults.locale.clone()),
                ]),
                OutputFormat::Json => print_json(&settings)?,
            }
        }
        SettingsCommand::Set { file } => {
            let json = tokio::fs::read_to_string(file).await?;
            let settings: Settings = serde_json::from_str(&json)?;
            backend
                .storage
                .put_settings(&backend.context(), settings)
                .await?;
            backend.save().await?;
            println!("Stored settings from {}", file.display());
        }
    }
    Ok(())
}
