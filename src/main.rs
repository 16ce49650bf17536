//! Sonance daemon.
//!
//! Restores the player session and user from storage, keeps playback time
//! moving on a headless clock, and serves the local control API.

use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sonance::api;
use sonance::client::{ApiPlayReporter, HttpApiClient, MusicApi};
use sonance::config::{self, LogFormat};
use sonance::identity::IdentityStore;
use sonance::models::AppState;
use sonance::player::{ClockDriver, ClockPrimitive, PlayerOptions, PlayerStore};
use sonance::storage::{JsonFileStorage, SharedStorage};
use sonance::wallet::{WalletBridge, WalletProvider};

/// Initialize the tracing/logging subsystem.
fn init_tracing(config: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.log_format {
        LogFormat::Json => {
            subscriber
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            subscriber
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}

/// Configure CORS based on application config.
fn configure_cors(config: &config::Config) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600);

    if config.cors_origins.len() == 1 && config.cors_origins[0] == "*" {
        cors = cors.allow_any_origin();
    } else {
        for origin in &config.cors_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

/// Drive the headless clock and feed its events to the player.
fn spawn_clock(
    driver: ClockDriver,
    player: Arc<Mutex<PlayerStore>>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            driver.drive(&mut player.lock());
        }
    })
}

/// Graceful shutdown handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

fn startup_error(what: &str, e: impl std::fmt::Display) -> std::io::Error {
    tracing::error!(error = %e, "Failed to initialize {what}");
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize configuration
    let config = config::init();

    // Initialize logging
    init_tracing(config);

    // Validate configuration
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Configuration validation failed");
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }

    let storage: SharedStorage = Arc::new(
        JsonFileStorage::new(&config.storage_file).map_err(|e| startup_error("storage", e))?,
    );

    let api: Arc<dyn MusicApi> = Arc::new(
        HttpApiClient::new(&config.api_base_url, config.request_timeout(), storage.clone())
            .map_err(|e| startup_error("API client", e))?,
    );

    let wallet: Option<Arc<dyn WalletProvider>> = match &config.wallet_url {
        Some(url) => Some(Arc::new(
            WalletBridge::new(url, config.request_timeout())
                .map_err(|e| startup_error("wallet bridge", e))?,
        )),
        None => {
            tracing::info!("WALLET_URL not set, wallet routes will report no wallet");
            None
        }
    };

    // Cached user first, then one background reconcile with the API
    let identity = Arc::new(IdentityStore::load(storage.clone()));
    identity.spawn_refresh(api.clone());

    let reporter = Arc::new(ApiPlayReporter::new(
        api.clone(),
        identity.clone(),
        tokio::runtime::Handle::current(),
    ));

    let (clock, driver) = ClockPrimitive::new();
    let player = Arc::new(Mutex::new(PlayerStore::new(
        Box::new(clock),
        storage.clone(),
        reporter,
        PlayerOptions {
            played_threshold_secs: config.played_threshold_secs,
        },
    )));
    let clock_task = spawn_clock(driver, player.clone(), config.tick_interval());

    let app_state = AppState {
        player,
        identity,
        api,
        wallet,
    };

    let bind_address = config.bind_address();

    tracing::info!(
        address = %bind_address,
        api_base_url = %config.api_base_url,
        storage_file = %config.storage_file.display(),
        "Starting Sonance"
    );

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(configure_cors(config))
            .app_data(web::Data::new(app_state.clone()))
            .configure(api::health::configure)
            .configure(api::player::configure)
            .configure(api::session::configure)
            .configure(api::catalog::configure)
            .configure(api::wallet::configure)
    })
    .bind(&bind_address)?
    .shutdown_timeout(10)
    .run();

    let result = tokio::select! {
        result = server => {
            result
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown complete");
            Ok(())
        }
    };

    clock_task.abort();
    result
}
