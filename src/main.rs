//! Vialy - Conversational assistant for the Colombian traffic code
//!
//! Main entry point for the Vialy CLI.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vialy::cli::{Cli, Commands};
use vialy::commands;
use vialy::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    // Mirror a CLI storage override into the environment so
    // SqliteStore::new() honors it even on paths that build the store
    // without consulting session.db_path.
    if let Some(db_path) = &cli.storage_path {
        std::env::set_var("VIALY_SESSIONS_DB", db_path);
        tracing::info!("Using storage DB override from CLI: {}", db_path);
    }

    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;
    config.validate()?;

    match cli.command {
        Commands::Ask {
            query,
            owner,
            session,
            ..
        } => {
            tracing::info!("Answering one-shot question");
            commands::run_ask(config, query, owner, session).await
        }
        Commands::Chat { owner, session, .. } => {
            tracing::info!("Starting interactive chat");
            commands::run_chat(config, owner, session).await
        }
        Commands::Status => commands::run_status(&config),
        Commands::Info { session } => commands::run_info(&config, &session),
        Commands::Clear { session } => commands::run_clear(&config, &session),
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "vialy=debug" } else { "vialy=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
