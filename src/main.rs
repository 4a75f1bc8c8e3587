//! folio-api server entry point.
//!
//! Resolves configuration, initializes tracing, and hands control to the
//! bootstrap. Every fatal error surfaces here as a non-zero exit with a
//! readable diagnostic.

use tracing_subscriber::EnvFilter;

use folio_api::bootstrap;
use folio_api::config::{AppConfig, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(&config);
    tracing::info!(addr = %config.listen_addr, "starting folio-api");

    bootstrap::run(config).await?;
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
