//! geomux - geocoding aggregation service
//!
//! Startup:
//! 1. Load bootstrap TOML (CLI → `GEOMUX_CONFIG` → user config dir → defaults)
//! 2. Initialize tracing (`RUST_LOG`, else TOML `[logging] level`)
//! 3. Resolve and create the root folder, open the database
//! 4. Seed providers from the TOML `[[providers]]` table
//! 5. Serve HTTP until Ctrl-C

use anyhow::{Context, Result};
use clap::Parser;
use geomux_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use geomux_common::db;
use geomux_engine::AppState;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "geomux", version, about = "Geocoding provider aggregation service")]
struct Cli {
    /// Bootstrap TOML file
    #[arg(long, env = "GEOMUX_CONFIG")]
    config: Option<PathBuf>,

    /// Folder holding the database
    #[arg(long, env = "GEOMUX_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// HTTP port (overrides TOML)
    #[arg(long, env = "GEOMUX_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Step 1: Bootstrap config (needed before tracing for the log level)
    let config = TomlConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;

    // Step 2: Tracing
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("Invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting geomux");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Step 3: Root folder and database
    let root_folder = RootFolderResolver::new(cli.root_folder, config.root_folder.clone()).resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = config.database_path_in(initializer.root_folder());
    info!("Database: {}", db_path.display());
    let db_pool = db::init_database(&db_path).await?;
    info!("Database connection established");

    // Step 4: Seed providers listed in the config file
    let seeded = db::providers::seed_providers(&db_pool, &config.providers).await?;
    if seeded > 0 {
        info!(seeded, "Providers seeded from config file");
    }

    // Step 5: Shared HTTP transport and application state
    let http = reqwest::Client::builder()
        .user_agent(concat!("geomux/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")?;

    let state = AppState::new(db_pool, config.parameters.clone(), http);
    let shutdown = state.shutdown.clone();
    let app = geomux_engine::build_router(state);

    let port = cli.port.unwrap_or(config.port);
    let addr = format!("{}:{}", config.bind_address, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown requested"),
                Err(e) => {
                    warn!("Ctrl-C handler unavailable: {}", e);
                    std::future::pending::<()>().await;
                }
            }
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
