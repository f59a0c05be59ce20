use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

use game_core::{Dictionary, SessionCleanup};
use game_server::{
    config::Config,
    create_routes,
    registry::{RegistrySettings, SessionRegistry},
    websocket::ConnectionManager,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Word Capture server...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    info!("Loading words from directory: {}", config.words_directory);
    let dictionary = match Dictionary::load_directory(&config.words_directory) {
        Ok(dictionary) => {
            info!("Languages available: {:?}", dictionary.languages());
            Arc::new(dictionary)
        }
        Err(e) => {
            error!(
                "Failed to load words from directory '{}': {:#}",
                config.words_directory, e
            );
            error!("Set WORDS_DIRECTORY to a directory containing words-<language>.txt files.");
            std::process::exit(1);
        }
    };

    let connection_manager = Arc::new(ConnectionManager::new());
    let registry = Arc::new(SessionRegistry::new(
        dictionary,
        connection_manager.clone(),
        RegistrySettings::from(&config),
    ));

    let routes = create_routes(connection_manager.clone(), registry.clone());

    // Start cleanup task
    let cleanup_connection_manager = connection_manager.clone();
    let cleanup_registry = registry.clone();
    let connection_timeout = config.connection_timeout();
    let cleanup = SessionCleanup::new(config.lobby_timeout(), config.finished_retention());
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            interval.tick().await;

            for connection_id in cleanup_connection_manager.inactive_connections(connection_timeout)
            {
                info!("Dropping inactive connection {}", connection_id);
                if let Some(player) = cleanup_connection_manager.remove_connection(connection_id) {
                    cleanup_registry.handle_disconnect(&player).await;
                }
            }

            let removed = cleanup_registry.cleanup(&cleanup).await;
            if removed > 0 {
                info!("Cleaned up {} games", removed);
            }
        }
    });

    let ip = match config.host.parse::<std::net::IpAddr>() {
        Ok(ip) => ip,
        Err(e) => {
            error!("Invalid HOST '{}': {}", config.host, e);
            std::process::exit(1);
        }
    };

    info!("Server starting on {}:{}", config.host, config.port);

    let (addr, server) =
        warp::serve(routes).bind_with_graceful_shutdown((ip, config.port), shutdown_signal());

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}

async fn shutdown_signal() {
    // Wait for SIGINT (Ctrl+C) or SIGTERM
    #[cfg(unix)]
    {
        let (mut sigint, mut sigterm) = match (
            signal::unix::signal(signal::unix::SignalKind::interrupt()),
            signal::unix::signal(signal::unix::SignalKind::terminate()),
        ) {
            (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
            _ => {
                error!("Failed to install signal handlers");
                std::future::pending::<()>().await;
                return;
            }
        };

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for ctrl+c: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down gracefully...");
    }
}
