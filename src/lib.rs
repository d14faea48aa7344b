pub mod backend;
pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod models;
pub mod session;
pub mod stream;

use backend::new_backend;
use cli::Args;
use config::ClientConfig;
use log::{ info, warn };
use session::SessionController;
use std::error::Error;

pub use error::ClientError;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = ClientConfig::from_args(&args)?;

    info!("--- Client Configuration ---");
    info!("Backend URL: {}", config.backend_url);
    info!("Connect Timeout: {:?}", config.connect_timeout);
    info!("Request Timeout: {:?}", config.request_timeout);
    info!("Dark Mode: {}", config.dark_mode);
    info!("Event Buffer: {}", config.event_buffer);
    info!("----------------------------");

    let backend = new_backend(&config)?;
    match backend.health().await {
        Ok(true) => info!("Backend reachable at {}", config.backend_url),
        Ok(false) => warn!("Backend at {} reports an unhealthy status", config.backend_url),
        Err(e) => warn!("Backend at {} not reachable yet: {}", config.backend_url, e),
    }

    let session = SessionController::from_config(backend, &config);
    console::run_console(session).await
}
