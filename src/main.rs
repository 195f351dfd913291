use std::process::ExitCode;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use ozima::{Config, WebServer};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let config_path =
        std::env::var("OZIMA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    // Load configuration
    let mut config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    // Initialize logging
    if let Err(e) = ozima::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        ozima::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    info!("ozima - remote filesystem API");

    let mut servers = Vec::new();
    if config.storage_api.enabled {
        match WebServer::storage_api(&config) {
            Ok(server) => servers.push(server),
            Err(e) => {
                error!("Failed to set up storage API: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }
    if config.fs_api.enabled {
        match WebServer::fs_api(&config) {
            Ok(server) => servers.push(server),
            Err(e) => {
                error!("Failed to set up filesystem API: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    if servers.is_empty() {
        error!("Both services are disabled; nothing to run");
        return ExitCode::FAILURE;
    }

    let shutdown = CancellationToken::new();
    let mut tasks = JoinSet::new();
    for server in servers {
        let token = shutdown.clone();
        tasks.spawn(server.run(async move { token.cancelled().await }));
    }

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
            }
            shutdown.cancel();
        });
    }

    let mut code = ExitCode::SUCCESS;
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("Server error: {}", e);
                code = ExitCode::FAILURE;
                shutdown.cancel();
            }
            Err(e) => {
                error!("Server task failed: {}", e);
                code = ExitCode::FAILURE;
                shutdown.cancel();
            }
        }
    }

    code
}
