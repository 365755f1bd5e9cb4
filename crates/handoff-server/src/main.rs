use anyhow::{Context, Result};
use handoff_server::config::ServerConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let default_filter =
        std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info,handoff=debug".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    // Load configuration from environment variables
    let config = ServerConfig::load().context("Failed to load configuration")?;

    // Run the server using the library's run function
    handoff_server::run(config).await.context("Server error")?;

    Ok(())
}
