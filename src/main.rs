use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use formbuilder_api::app::app;
use formbuilder_api::config::AppConfig;
use formbuilder_api::database::DatabaseManager;
use formbuilder_api::state::AppState;
use formbuilder_api::storage::s3::S3Storage;

#[derive(Parser)]
#[command(name = "formbuilder-api")]
#[command(about = "Form builder API server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Apply pending database migrations and exit")]
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    config.validate().context("invalid configuration")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Migrate => {
            let pool = DatabaseManager::connect_lazy(&config.database)?;
            DatabaseManager::migrate(&pool).await?;
            Ok(())
        }
        Commands::Serve => serve(config).await,
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Form Builder API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect_lazy(&config.database)?;
    if config.database.run_migrations {
        DatabaseManager::migrate(&pool).await.context("running migrations")?;
    }

    let storage = Arc::new(S3Storage::from_config(&config.storage).context("configuring object storage")?);
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let sweep_every = Duration::from_secs(config.api.rate_limit_sweep_secs.max(1));
    let rate_limited = config.api.enable_rate_limiting;

    let state = AppState::new(config, pool, storage).context("configuring JWT verification")?;
    if rate_limited {
        state.rate_limiter.spawn_sweeper(sweep_every);
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Form Builder API listening on http://{}", bind_addr);

    axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("server error")?;
    Ok(())
}
