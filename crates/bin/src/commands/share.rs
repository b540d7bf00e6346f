//! Share link commands.

use std::time::Duration;

use filekeep::{
    ShareKey, UserKey,
    clock::format_secs,
    share::{Share, Visibility},
};

use crate::backend::Backend;
use crate::cli::{ShareCommand, ShareCreateArgs};
use crate::output::{OutputFormat, print_json, print_table};

pub async fn run(
    backend: &Backend,
    command: &ShareCommand,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        ShareCommand::Create(args) => create(backend, args, format).await,
        ShareCommand::Delete { key } => delete(backend, key).await,
        ShareCommand::List { owner } => list(backend, owner.as_deref(), format).await,
    }
}

async fn create(
    backend: &Backend,
    args: &ShareCreateArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let owner = args.owner.as_str();
    let path = args.path.as_str();
    let mut share = match &args.key {
        Some(key) => Share::with_key(key.as_str(), owner, path),
        None => Share::new(owner, path),
    };
    if args.private {
        share = share.with_visibility(Visibility::Private);
    }
    if let Some(secs) = args.expires_in {
        share = share.expiring_in(backend.storage.now_secs(), Duration::from_secs(secs))?;
    }

    let key = backend.storage.create_share(&backend.context(), share).await?;
    backend.save().await?;

    match format {
        OutputFormat::Human => println!("Created share {key}"),
        OutputFormat::Json => print_json(&serde_json::json!({ "key": key }))?,
    }
    Ok(())
}

async fn delete(backend: &Backend, key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let key = ShareKey::from(key);
    backend.storage.delete_share(&backend.context(), &key).await?;
    backend.save().await?;
    println!("Deleted share {key}");
    Ok(())
}

async fn list(
    backend: &Backend,
    owner: Option<&str>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let owner = owner.map(UserKey::from);
    let shares = backend
        .storage
        .list_shares(&backend.context(), owner.as_ref())
        .await?;
    // Listing may have purged expired shares.
    backend.save().await?;

    match format {
        OutputFormat::Human => {
            if shares.is_empty() {
                println!("No shares found.");
                return Ok(());
            }
            let rows: Vec<_> = shares
                .iter()
                .map(|s| {
                    vec![
                        s.key.to_string(),
                        s.owner.to_string(),
                        s.path.clone(),
                        match s.visibility {
                            Visibility::Public => "public",
                            Visibility::Private => "private",
                        }
                        .to_string(),
                        s.expires_at
                            .map(format_secs)
                            .unwrap_or_else(|| "never".to_string()),
                    ]
                })
                .collect();
            print_table(&["KEY", "OWNER", "PATH", "VISIBILITY", "EXPIRES"], &rows);
        }
        OutputFormat::Json => print_json(&shares)?,
    }
    Ok(())
}
