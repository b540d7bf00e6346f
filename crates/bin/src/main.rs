use clap::Parser;
use tracing_subscriber::EnvFilter;

mod backend;
mod cli;
mod commands;
mod output;

use backend::Backend;
use cli::{Cli, Commands};
use output::OutputFormat;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("filekeep=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from_flag(cli.global.json);

    if let Commands::Init = cli.command {
        return commands::init::run(&cli.global).await;
    }

    let backend = Backend::open(&cli.global).await?;
    match &cli.command {
        Commands::Init => Ok(()),
        Commands::User { command } => commands::user::run(&backend, command, format).await,
        Commands::Share { command } => commands::share::run(&backend, command, format).await,
        Commands::Auth { command } => commands::auth::run(&backend, command, format).await,
        Commands::Settings { command } => {
            commands::settings::run(&backend, command, format).await
        }
        Commands::Check(args) => commands::check::run(&backend, args, format).await,
    }
}
