//! One-Shield Workload Balancer
//!
//! Distributes classified security incidents across SOC analysts while
//! enforcing SAFE MODE limits on alert volume and committed work.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  WORKLOAD BALANCER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────┐  ┌─────────────────────────┐ │
//! │  │  API      │  │  Engine   │  │  Roster Store           │ │
//! │  │  (Axum)   │─▶│  (pass on │─▶│  (per-roster mutex,     │ │
//! │  │           │  │  blocking │  │   snapshot + history)   │ │
//! │  │           │  │  worker)  │  │                         │ │
//! │  └─────┬─────┘  └───────────┘  └─────────────────────────┘ │
//! │        ▼                                                    │
//! │  ┌─────────────────────┐                                    │
//! │  │ Audit (tracing,     │                                    │
//! │  │  optional Postgres) │                                    │
//! │  └─────────────────────┘                                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod audit;
mod config;
mod engine;
mod error;
mod handlers;
mod models;
mod settings;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use parking_lot::RwLock;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

use audit::AuditLog;
use settings::EngineSettings;
use store::WorkloadStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "workload_balancer=debug,tower_http=debug".into());
    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Workload balancer starting ({})...", config.environment);

    // Optional audit database
    let pool = match &config.database_url {
        Some(url) => {
            tracing::info!("Audit database: {}", url.split('@').last().unwrap_or("***"));
            let pool = audit::create_pool(url)
                .await
                .context("Failed to create audit database pool")?;
            audit::run_migrations(&pool)
                .await
                .context("Failed to apply audit schema")?;
            Some(pool)
        }
        None => {
            tracing::info!("DATABASE_URL not set, audit records go to the log only");
            None
        }
    };

    let state = AppState::new(config.clone(), AuditLog::new(pool));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub settings: Arc<RwLock<EngineSettings>>,
    pub store: Arc<WorkloadStore>,
    pub audit: AuditLog,
}

impl AppState {
    pub fn new(config: config::Config, audit: AuditLog) -> Self {
        Self {
            config,
            settings: Arc::new(RwLock::new(EngineSettings::default())),
            store: Arc::new(WorkloadStore::new()),
            audit,
        }
    }
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/v1/balance", post(handlers::balance::run))
        .route("/api/v1/status", get(handlers::status::get))
        .route("/api/v1/recommendations", get(handlers::recommendations::get))
        .route(
            "/api/v1/config",
            get(handlers::config::get).put(handlers::config::update),
        )
        .route("/api/v1/workload/reset", post(handlers::workload::reset));

    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
