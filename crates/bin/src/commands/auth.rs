//! Auth rule commands.

use filekeep::{
    RuleId,
    auth::{AuthMethod, AuthRule},
};

use crate::backend::Backend;
use crate::cli::{AuthCommand, AuthSetArgs, Method};
use crate::output::{OutputFormat, print_json, print_table};

pub async fn run(
    backend: &Backend,
    command: &AuthCommand,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        AuthCommand::Set(args) => set(backend, args).await,
        AuthCommand::Delete { id } => delete(backend, id).await,
        AuthCommand::List => list(backend, format).await,
    }
}

fn method(args: &AuthSetArgs) -> AuthMethod {
    match args.method {
        Method::Json => AuthMethod::Json,
        Method::Proxy => AuthMethod::Proxy {
            header: args.header.clone().unwrap_or_default(),
        },
        Method::Hook => AuthMethod::Hook {
            command: args.command.clone().unwrap_or_default(),
        },
        Method::Noauth => AuthMethod::NoAuth,
    }
}

async fn set(backend: &Backend, args: &AuthSetArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut rule = AuthRule::new(args.id.as_str(), method(args));
    if let Some(subject) = &args.subject {
        rule = rule.for_subject(subject.as_str());
    }

    backend.storage.upsert_auth_rule(&backend.context(), rule).await?;
    backend.save().await?;
    println!("Stored auth rule {}", args.id);
    Ok(())
}

async fn delete(backend: &Backend, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let id = RuleId::from(id);
    backend.storage.delete_auth_rule(&backend.context(), &id).await?;
    backend.save().await?;
    println!("Deleted auth rule {id}");
    Ok(())
}

async fn list(backend: &Backend, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let rules = backend.storage.list_auth_rules(&backend.context()).await?;

    match format {
        OutputFormat::Human => {
            if rules.is_empty() {
                println!("No auth rules found.");
                return Ok(());
            }
            let rows: Vec<_> = rules
                .iter()
                .map(|r| {
                    let detail = match &r.method {
                        AuthMethod::Proxy { header } => header.clone(),
                        AuthMethod::Hook { command } => command.clone(),
                        AuthMethod::Json | AuthMethod::NoAuth => String::new(),
                    };
                    vec![
                        r.id.to_string(),
                        r.method.name().to_string(),
                        detail,
                        r.subject
                            .as_ref()
                            .map(|s| s.to_string())
                            .unwrap_or_else(|| "(global)".to_string()),
                    ]
                })
                .collect();
            print_table(&["ID", "METHOD", "DETAIL", "SUBJECT"], &rows);
        }
        OutputFormat::Json => print_json(&rules)?,
    }
    Ok(())
}
