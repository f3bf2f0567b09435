//! Contract Tracker
//!
//! Backend for the contract-management SPA. Sits between the browser and the
//! upstream contract REST API.
//!
//! ## Features
//!
//! - **Snapshot**: Periodic and focus-triggered reload of contracts and periods
//! - **Deadlines**: Upcoming/overdue notices with priorities per delivery period
//! - **Reports**: Filtered CSV downloads and printable tables

mod auth;
mod config;
mod domain;
mod export;
mod handlers;
mod models;
mod scheduler;
mod source;
mod validation;

use auth::Session;
use axum::{middleware, Router};
use handlers::AppState;
use scheduler::RefreshScheduler;
use source::{ApiClient, SnapshotRefresher, SnapshotStore};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contract_tracker=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Starting Contract Tracker");
    tracing::info!("Environment: {:?}", config.environment);

    let client = ApiClient::new(&config.api_base_url, config.request_timeout)?;
    tracing::info!("Upstream API: {}", client.base_url());
    let store = SnapshotStore::new();

    // Background refresh: first tick loads the initial snapshot
    let (scheduler, focus) = RefreshScheduler::new(config.refresh_interval);
    let refresher = SnapshotRefresher::new(
        client.clone(),
        Session::service(config.api_token.clone()),
        store.clone(),
    );
    scheduler.spawn(refresher);
    tracing::info!(
        "Refreshing contract snapshot every {}s",
        config.refresh_interval.as_secs()
    );

    // Create application state
    let state = AppState {
        source: Arc::new(client),
        store,
        focus,
        is_production: config.is_production(),
    };

    // Build CORS layer
    let cors = if config.is_production() {
        CorsLayer::new()
            .allow_origin(
                config
                    .cors_origins
                    .iter()
                    .filter_map(|o| o.parse().ok())
                    .collect::<Vec<_>>(),
            )
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::permissive()
    };

    // Build main router
    let app = Router::new()
        .nest("/api", handlers::api_routes())
        .nest_service("/", ServeDir::new(&config.frontend_dir))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::middleware::security_headers::<ApiClient>,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    // Start server
    let addr = config.server_addr();
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Frontend served from: {}", config.frontend_dir);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
