//! Autobook Server - bookkeeping for an auto repair shop.
//!
//! Keeps income records, bookings, the price list and staff accounts in a
//! local persisted store, and synchronizes them with a remote JSON document
//! store: merge on sign-in, debounced pushes after local edits, and daily
//! backups of the production branch.

mod auth;
mod backup;
mod config;
mod error;
mod remote;
mod routes;
mod storage;
mod sync;

use crate::auth::SessionRegistry;
use crate::backup::{BackupScheduler, BackupService};
use crate::config::Config;
use crate::remote::HttpDocumentStore;
use crate::storage::{ChangeReceiver, Ledger, PersistedStore};
use crate::sync::{PushScheduler, SyncEngine};
use autobook_engine::{BackupPolicy, Environment};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ledger: Arc<Ledger>,
    pub sync: Arc<SyncEngine<HttpDocumentStore>>,
    pub backups: Arc<BackupService<HttpDocumentStore>>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Open the local store and wire the services together.
    pub fn open(config: Config) -> Result<(Self, ChangeReceiver), Box<dyn std::error::Error>> {
        let store = Arc::new(PersistedStore::open(&config.data_dir)?);
        let (ledger, changes) = Ledger::new(store.clone())?;
        let ledger = Arc::new(ledger);

        let remote = Arc::new(HttpDocumentStore::new(&config.remote_store_url)?);
        let environment = Environment::new(config.public_hostname.clone());

        let sync = Arc::new(SyncEngine::new(
            environment.clone(),
            remote.clone(),
            ledger.clone(),
        ));
        let backups = Arc::new(BackupService::new(
            environment,
            remote,
            ledger.clone(),
            BackupPolicy::with_target_hour(config.backup_hour),
        ));
        let sessions = Arc::new(SessionRegistry::load(store));
        sync.set_authenticated(!sessions.is_empty());

        let state = AppState {
            config: Arc::new(config),
            ledger,
            sync,
            backups,
            sessions,
        };
        Ok((state, changes))
    }
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autobook_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Autobook Server on {}:{}", config.host, config.port);
    tracing::info!(
        data_dir = %config.data_dir.display(),
        remote = %config.remote_store_url,
        "Using local and remote stores"
    );

    let (state, changes) = AppState::open(config.clone())?;

    remote::ensure_branches(state.sync.store()).await;

    let pushes = PushScheduler::spawn(state.sync.clone(), changes, config.sync_debounce);
    let backups = BackupScheduler::spawn(state.backups.clone(), config.backup_check_interval);

    // Sessions restored from the previous run count as signed in.
    if state.sync.is_authenticated() {
        let sync = state.sync.clone();
        tokio::spawn(async move {
            sync.load_from_cloud(false).await;
        });
    }

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pushes.shutdown();
    backups.shutdown();
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
