//! RAM -- Report Analysis Management for automated test executions.
//!
//! This crate provides the core library for recording execution requests,
//! test runs and log records, aggregating them into reports, and serving
//! everything over a REST API.

pub mod api;
pub mod archive;
pub mod catalogue;
pub mod charts;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod files;
pub mod lists;
pub mod mail;
pub mod model;
pub mod report;
pub mod service;
pub mod storage;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig, RamConfig};

/// Install the global subscriber on stderr. `RUST_LOG` wins over the
/// configured level.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Start the RAM daemon: API server and archive job.
pub async fn serve(config: RamConfig) -> Result<()> {
    // 1. Initialize Storage
    let db_path = &config.storage.db_path;
    tracing::info!(db_path = %db_path.display(), "Initializing database");
    let pool = storage::open_pool(db_path)?;

    // 2. Start Archive Job (background task)
    if config.archive.enabled {
        let job = archive::ArchiveJob::new(&config.archive, service::ExecutionService::new(pool.clone()))?;
        tokio::spawn(archive::run_archive_loop(job));
    } else {
        tracing::info!("Archive job disabled");
    }

    // 3. Start API Server
    let state = api::state::AppState::from_config(pool, &config)?;
    let app = api::router(state);

    let addr: std::net::SocketAddr = config.server.bind.parse()?;
    tracing::info!(%addr, "RAM listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
