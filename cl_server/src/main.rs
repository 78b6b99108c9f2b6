//! League server: round-robin fixtures, score entry and standings over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use cl_server::{
    api,
    config::{ServerConfig, StorageBackend},
    logging,
};
use court_league::{
    TournamentManager,
    db::{Database, InMemoryRepository},
};
use log::info;
use pico_args::Arguments;

const HELP: &str = "\
Run the court league server

USAGE:
  cl_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:7878]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  --memory                 Keep all data in memory instead of PostgreSQL
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  STORAGE_MEMORY           Set to true to use the in-memory backend
  DB_MAX_CONNECTIONS       Pool size limits (also DB_MIN_CONNECTIONS)
  DB_*_TIMEOUT_SECS        Connection and idle timeouts, DB_MAX_LIFETIME_SECS
  RUST_LOG                 Log filter [default: info,sqlx=warn,hyper=warn]
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        memory: pargs.contains("--memory"),
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url, args.memory)?;
    info!("Starting league server at {}", config.bind);

    let (manager, database) = match &config.storage {
        StorageBackend::Postgres(db_config) => {
            let db = Database::new(db_config)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
            info!("Database connected successfully");

            let pool = Arc::new(db.pool().clone());
            (TournamentManager::new(pool), Some(db))
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; data is lost on shutdown");
            let repo = Arc::new(InMemoryRepository::new());
            (TournamentManager::with_repository(repo), None)
        }
    };

    let app = api::create_router(api::AppState::new(manager, database.clone()));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
