//! # AnythingVoice API Main Entry Point

use anyhow::{Context, Result};
use anythingvoice::{
    config::ConfigLoader,
    db,
    seeds::seed_voice_options,
    server::{AppState, run_server},
    telemetry,
};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "anythingvoice")]
#[command(about = "AI voice receptionist backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run migrations, seed reference data and start the HTTP server (default)
    Serve,

    /// Apply pending database migrations
    Migrate,

    /// Insert reference data such as the voice catalogue
    Seed,

    /// Run the lead pipeline for URLs from the command line
    Pipeline {
        /// Website URLs
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new().load().context("loading configuration")?;
    config.validate().context("validating configuration")?;
    telemetry::init_tracing(&config).context("initializing telemetry")?;

    if let Ok(redacted_json) = config.redacted_json() {
        tracing::info!(profile = %config.profile, config = %redacted_json, "Configuration loaded");
    }

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            db::run_migrations(&db).await?;
            seed_voice_options(&db).await?;
            run_server(config, db).await
        }
        Command::Migrate => {
            db::run_migrations(&db).await?;
            tracing::info!("Migrations applied");
            Ok(())
        }
        Command::Seed => {
            let inserted = seed_voice_options(&db).await?;
            tracing::info!(inserted, "Seeding finished");
            Ok(())
        }
        Command::Pipeline { urls } => {
            let state = AppState::new(config, db);
            let outcome = state.pipeline.run_batch(&urls).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
    }
}
