//! gametracker-api - Personal video-game progress tracker backend
//!
//! REST service persisting game records to SQLite, with a CSV bulk
//! importer and dashboard aggregation endpoints.

use anyhow::Result;
use clap::Parser;
use gametracker_api::{build_router, covers::CoverClient, AppState};
use gametracker_common::config::Config;
use gametracker_common::db;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "gametracker-api", version, about)]
struct Cli {
    /// Folder holding the database file
    #[arg(long)]
    root_folder: Option<String>,

    /// HTTP listen port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting GameTracker API v{}",
        env!("CARGO_PKG_VERSION")
    );

    let cli = Cli::parse();
    let config = Config::resolve(cli.root_folder.as_deref(), cli.port)?;
    config.ensure_root_folder()?;

    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());

    let pool = db::init_database(&db_path).await?;

    if config.rawg_api_key.is_none() {
        info!("RAWG API key not configured; cover lookups will fail until one is set");
    }
    let covers = CoverClient::new(config.rawg_api_key.clone())?;

    let state = AppState::new(pool, covers);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port)).await?;
    info!("gametracker-api listening on http://127.0.0.1:{}", config.port);
    info!("Health check: http://127.0.0.1:{}/health", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
