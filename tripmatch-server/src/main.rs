//! Tripmatch Server
//!
//! Travel companion matching: posts, compatibility matching, match
//! responses, trip formation and live notifications.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use tripmatch_core::events::{ChannelNotifier, Notifier, delivery_channel, notification_channel};
use tripmatch_core::processors::{
    NotificationDispatcher, OnlineUsers, PromotionSweeper, TripPromotion,
};
use tripmatch_core::store::{MatchStore, PgMatchStore};

/// Tripmatch - travel companion matching service
#[derive(Parser, Debug)]
#[command(name = "tripmatch-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./tripmatch.toml")]
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

    tracing::info!("Starting tripmatch-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    let channel_buffer = loaded_config.notifications.channel_buffer;
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

    // Notification plumbing
    let (notification_tx, notification_rx) = notification_channel(channel_buffer);
    let online = OnlineUsers::new(delivery_channel(channel_buffer));
    let notifier: Arc<dyn Notifier> = Arc::new(ChannelNotifier::new(notification_tx));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let store: Arc<dyn MatchStore> = Arc::new(PgMatchStore::new(db_pool.clone()));

    // Background processors
    let dispatcher =
        NotificationDispatcher::new(online.clone(), notification_rx, shutdown_rx.clone());
    let dispatcher_handle = tokio::spawn(dispatcher.run());

    let sweeper = PromotionSweeper::new(
        store.clone(),
        TripPromotion::new(store.clone(), notifier.clone()),
        shared_config.sweeper.clone(),
        shutdown_rx,
    );
    let sweeper_handle = tokio::spawn(sweeper.run());

    let state = AppState::new(store, notifier, shared_config.clone(), online);

    // Spawn config reload handler (listens for SIGHUP)
    let reload_notify = spawn_config_reload_handler(shared_config, config_loader);

    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Stop background tasks
    reload_notify.notify_one();
    let _ = shutdown_tx.send(true);
    if let Err(e) = dispatcher_handle.await {
        tracing::error!(error = %e, "NotificationDispatcher task failed");
    }
    if let Err(e) = sweeper_handle.await {
        tracing::error!(error = %e, "PromotionSweeper task failed");
    }

    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
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
