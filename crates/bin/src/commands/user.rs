//! User management commands.

use filekeep::{
    UserKey,
    clock::format_secs,
    user::{Permissions, Scope, User},
};

use crate::backend::Backend;
use crate::cli::{UserCommand, UserCreateArgs};
use crate::output::{OutputFormat, print_fields, print_json, print_table};

pub async fn run(
    backend: &Backend,
    command: &UserCommand,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        UserCommand::Create(args) => create(backend, args, format).await,
        UserCommand::Delete { key } => delete(backend, key).await,
        UserCommand::List => list(backend, format).await,
        UserCommand::Show { key } => show(backend, key, format).await,
    }
}

/// Build the new user from the stored defaults, then apply the flags.
async fn create(
    backend: &Backend,
    args: &UserCreateArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = backend.context();
    let mut user = match &args.key {
        Some(key) => User::with_key(key.as_str(), args.username.as_str()),
        None => User::new(args.username.as_str()),
    };

    match backend.storage.get_settings(&ctx).await {
        Ok(settings) => {
            user.scope = settings.defaults.scope;
            user.locale = settings.defaults.locale;
            user.permissions = settings.defaults.permissions;
            if settings.create_user_dir {
                let base = settings.user_home_base_path.trim_end_matches('/');
                user.home = format!("{base}/{}", args.username);
            }
        }
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e.into()),
    }

    if let Some(home) = &args.home {
        user.home = home.clone();
    }
    if args.group {
        user.scope = Scope::Group;
    }
    if args.admin {
        user.permissions = Permissions::all();
    }

    let key = backend.storage.create_user(&ctx, user).await?;
    backend.save().await?;

    match format {
        OutputFormat::Human => println!("Created user {key}"),
        OutputFormat::Json => print_json(&serde_json::json!({ "key": key }))?,
    }
    Ok(())
}

async fn delete(backend: &Backend, key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let key = UserKey::from(key);
    match backend.storage.delete_user(&backend.context(), &key).await {
        Ok(()) => {
            backend.save().await?;
            println!("Deleted user {key}");
            Ok(())
        }
        Err(e) => {
            // An interrupted cascade has already removed some dependents.
            if e.is_retryable() {
                backend.save().await?;
                eprintln!("Deletion of {key} was interrupted; run the same command again");
            }
            Err(e.into())
        }
    }
}

async fn list(backend: &Backend, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let users = backend.storage.list_users(&backend.context()).await?;

    match format {
        OutputFormat::Human => {
            if users.is_empty() {
                println!("No users found.");
                return Ok(());
            }
            let rows: Vec<_> = users
                .iter()
                .map(|u| {
                    vec![
                        u.key.to_string(),
                        u.username.clone(),
                        scope_label(u.scope).to_string(),
                        u.home.clone(),
                        if u.permissions.admin { "yes" } else { "no" }.to_string(),
                    ]
                })
                .collect();
            print_table(&["KEY", "USERNAME", "SCOPE", "HOME", "ADMIN"], &rows);
        }
        OutputFormat::Json => print_json(&users)?,
    }
    Ok(())
}

async fn show(
    backend: &Backend,
    key: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = backend
        .storage
        .get_user(&backend.context(), &UserKey::from(key))
        .await?;

    match format {
        OutputFormat::Human => print_fields(&[
            ("Key", user.key.to_string()),
            ("Username", user.username.clone()),
            ("Scope", scope_label(user.scope).to_string()),
            ("Home", user.home.clone()),
            ("Locale", user.locale.clone()),
            ("Admin", user.permissions.admin.to_string()),
            ("Created", format_secs(user.created_at)),
        ]),
        OutputFormat::Json => print_json(&user)?,
    }
    Ok(())
}

fn scope_label(scope: Scope) -> &'static str {
    match scope {
        Scope::Individual => "individual",
        Scope::Group => "group",
    }
}
