use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use room_gateway::{
    config::{Config, Environment},
    server::Server,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("room_gateway=debug,tower_http=debug")),
        )
        .init();

    info!("Starting Room Gateway");

    let mut config = Config::load()?;

    // Check for production mode argument
    let args: Vec<String> = std::env::args().collect();
    if args.iter().skip(1).any(|arg| arg == "--production") {
        config.app.environment = Environment::Production;
    }

    info!("Configuration loaded: {:?}", config);
    if config.app.environment.is_production() {
        warn!("Production mode: error responses expose the raw error object");
    }

    let server = Server::new(config);

    // Handle graceful shutdown
    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                warn!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
