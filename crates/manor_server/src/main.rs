//! Castle Manor - Server

use std::path::PathBuf;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(manor_server::DEFAULT_CONFIG_PATH), PathBuf::from);

    tracing::info!("Starting Castle Manor server with {}", config_path.display());

    let config = match manor_server::load_config(&config_path).await {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = manor_server::run(config).await {
        tracing::error!("Manor server failed: {e}");
        std::process::exit(1);
    }
}
