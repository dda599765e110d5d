//! fieldnotes API Server
//!
//! HTTP API with health check, metrics, and command endpoints that run
//! through the same dispatcher as the Discord bot.

use dotenvy::dotenv;
use fieldnotes::config;
use fieldnotes::core::http::start_server;
use fieldnotes::core::runtime::{Runtime, RuntimeConfig};
use fieldnotes::logging;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let port = config::port();
    let env = config::get_environment();
    info!("Starting fieldnotes API Server");
    info!(environment = %env, "Environment");
    info!(port = port, "HTTP Server: http://0.0.0.0:{}", port);

    let runtime = Runtime::new(RuntimeConfig::from_env()).await?;
    let api_token = config::api_token();

    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(port, runtime.dispatcher, runtime.metrics, api_token).await {
            error!(error = %e, "HTTP server error");
        }
    });

    info!("API server started, waiting for shutdown signal...");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down API server...");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    Ok(())
}
