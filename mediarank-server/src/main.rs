//! mediarank-server - media ranking HTTP service
//!
//! Startup: resolve the root folder, open (or create) the database, load the
//! API shared secret, build search clients from configured keys, serve.

use anyhow::{Context, Result};
use clap::Parser;
use mediarank_common::api::auth::load_shared_secret;
use mediarank_common::config::{default_config_path, RootFolderInitializer, RootFolderResolver, TomlConfig};
use mediarank_common::db::init_database;
use mediarank_server::search::SearchService;
use mediarank_server::{build_router, AppState};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "mediarank-server", version, about = "Media ranking service")]
struct Args {
    /// Folder holding mediarank.db
    #[arg(long, env = "MEDIARANK_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Config file (default: ~/.config/mediarank/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, overrides [server] host
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overrides [server] port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config.clone().or_else(default_config_path);
    let toml_config = TomlConfig::load_or_default(config_path.as_deref());

    // RUST_LOG wins over [logging] level
    let default_directive: tracing_subscriber::filter::Directive = toml_config
        .logging
        .level
        .parse()
        .unwrap_or_else(|_| tracing::Level::INFO.into());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_directive)
                .from_env_lossy(),
        )
        .init();

    // Logged before any database work so startup is visible immediately
    info!(
        "Starting MediaRank server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new(args.root_folder.clone())
        .with_config_path(config_path)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let shared_secret = load_shared_secret(&pool)
        .await
        .context("Failed to load API shared secret")?;
    if shared_secret == 0 {
        warn!("API hash checking disabled (shared_secret = 0)");
    } else {
        info!("Loaded API shared secret");
    }

    let search = SearchService::from_config(&pool, &toml_config).await?;

    let state = AppState::new(pool, shared_secret, search);
    let app = build_router(state);

    let host = args.host.unwrap_or(toml_config.server.host);
    let port = args.port.unwrap_or(toml_config.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("mediarank-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
