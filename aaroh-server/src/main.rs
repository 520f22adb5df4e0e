//! Aaroh Music Academy server
//!
//! Course checkout, custom song orders and payment reconciliation against
//! the payment gateway.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use aaroh_core::clients::Mailer;
use aaroh_core::events::notification_channel;
use aaroh_core::framework::DatabaseProcessor;
use aaroh_core::processors::Notifier;
use clap::Parser;
use config::{ConfigLoader, get_database_url};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Expired login codes are swept this often.
const OTP_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Aaroh Music Academy - payment lifecycle backend
#[derive(Parser, Debug)]
#[command(name = "aaroh-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./aaroh-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting aaroh-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    // Convert to shared config with separate locks for each section
    let shared_config = loaded_config.into_shared();

    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    // Notifications are delivered by a background task fed from the handlers
    let (notifications_tx, notifications_rx) = notification_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let notifier = Notifier::new(
        DatabaseProcessor::new(db_pool.clone()),
        Mailer::new(shared_config.email.clone()),
        shared_config.email.clone(),
        notifications_rx,
        shutdown_rx.clone(),
    );
    let notifier_handle = tokio::spawn(notifier.run());

    let state = AppState::new(db_pool.clone(), shared_config, notifications_tx);

    let sweeper_handle = spawn_otp_sweeper(state.clone(), shutdown_rx);

    // Spawn config reload handler (listens for SIGHUP)
    let reload_shutdown = spawn_config_reload_handler(state.clone(), config_loader);

    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Stop background tasks
    reload_shutdown.notify_one();
    let _ = shutdown_tx.send(true);
    if let Err(e) = notifier_handle.await {
        tracing::error!("Notifier task failed: {}", e);
    }
    if let Err(e) = sweeper_handle.await {
        tracing::error!("OTP sweeper task failed: {}", e);
    }

    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Periodically drop expired login codes until shutdown.
fn spawn_otp_sweeper(
    state: AppState,
    mut shutdown_rx: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(OTP_SWEEP_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let purged = state.otp.purge_expired().await;
                    if purged > 0 {
                        tracing::debug!(purged, "Dropped expired login codes");
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
    })
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
