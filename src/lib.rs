pub mod config;
pub mod core_state; // Shared application state
pub mod crypto;
pub mod db;
pub mod forms; // Submitted-form validation
pub mod inference; // Image preprocessing + classifier
pub mod models;
pub mod uploads;
pub mod web; // Routes, middleware, pages

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ConfigError};
use crate::core_state::{CoreError, CoreState};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Initialization error: {0}")]
    Core(#[from] CoreError),
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default
/// filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Load configuration from the environment, serve until Ctrl-C, then shut
/// down gracefully.
pub async fn run() -> Result<(), StartupError> {
    init_tracing();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    tracing::info!(
        database = %config.database_path.display(),
        uploads = %config.upload_dir.display(),
        model = %config.model_path.display(),
        require_login = config.require_login,
        duplicates = config.duplicate_policy.as_str(),
        "Configuration loaded"
    );

    let bind_addr = config.bind_addr;
    let core = Arc::new(CoreState::from_config(config)?);
    let server = web::start_server_on(core, bind_addr).await?;
    tracing::info!(addr = %server.addr, "Listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    server.stop().await;

    Ok(())
}
