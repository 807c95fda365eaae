use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::{error, info};

use game_core::{FALLBACK_WORDS, FileWordList, WordSource};
use game_persistence::DatabaseManager;
use game_server::{
    auth::AuthService, config::Config, create_routes, dispatch::Dispatcher,
    game_manager::GameManager, link_manager::LinkManager,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    info!("Starting Wordle service...");

    let config = Config::new();

    let word_source = Arc::new(match &config.words_file {
        Some(path) => {
            info!("Loading words from {}", path);
            WordSource::new(FileWordList::new(path))
        }
        None => {
            info!("WORDS_FILE not set, using the built-in word list");
            WordSource::from_words(&FALLBACK_WORDS)
        }
    });

    let database = match DatabaseManager::connect(&config.database_url).await {
        Ok(database) => database,
        Err(e) => {
            error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };

    let game_manager = Arc::new(GameManager::new(
        word_source,
        database.games(),
        database.history(),
    ));
    if game_manager.warm_up() == 0 {
        error!("The vocabulary is empty; every new game will fail until words are provided");
    }

    let link_manager = Arc::new(LinkManager::new(
        database.links(),
        config.secondary_identity_prefix.clone(),
    ));

    let auth_service = if config.auth.dev_mode {
        info!("Starting in development authentication mode - JWT validation disabled");
        Arc::new(AuthService::new_dev_mode())
    } else {
        Arc::new(AuthService::new(&config.auth))
    };

    let dispatcher = Arc::new(Dispatcher::new(game_manager, link_manager.clone()));
    let routes = create_routes(dispatcher, auth_service);

    // Periodic sweep of PINs nobody redeemed
    let cleanup_interval = Duration::from_secs(config.pin_cleanup_interval_seconds.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            if let Err(e) = link_manager.cleanup_expired_pins().await {
                error!("PIN cleanup failed: {}", e);
            }
        }
    });

    info!("Server starting on {}:{}", config.host, config.port);

    let ip = match config.host.parse::<std::net::IpAddr>() {
        Ok(ip) => ip,
        Err(e) => {
            error!("Invalid HOST '{}': {}", config.host, e);
            std::process::exit(1);
        }
    };

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown((ip, config.port), async {
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
                .expect("Failed to install SIGINT handler");
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler");

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
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!("Server started successfully on {}. Press Ctrl+C to stop.", addr);
    server.await;
    info!("Server shutdown complete.");
}
