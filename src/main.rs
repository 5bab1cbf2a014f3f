//! toolshare-bookings server entry point.
//!
//! Starts the Axum HTTP server with the REST endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::http::StatusCode;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use toolshare_bookings::api;
use toolshare_bookings::app_state::AppState;
use toolshare_bookings::config::{ServiceConfig, StorageBackend};
use toolshare_bookings::domain::{Clock, SystemClock};
use toolshare_bookings::persistence::{BookingStore, MemoryStore, PostgresStore, ToolDirectory};
use toolshare_bookings::service::BookingService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServiceConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(
        addr = %config.listen_addr,
        storage = ?config.storage,
        policy = ?config.transition_policy,
        "starting toolshare-bookings"
    );

    // Build persistence layer
    let (tools, bookings): (Arc<dyn ToolDirectory>, Arc<dyn BookingStore>) = match config.storage
    {
        StorageBackend::Memory => {
            let store = match &config.tools_file {
                Some(path) => MemoryStore::from_catalog_file(path)
                    .await
                    .with_context(|| format!("loading tool catalogue {}", path.display()))?,
                None => {
                    tracing::warn!("TOOLS_FILE not set; memory store starts with no tools");
                    MemoryStore::new()
                }
            };
            let store = Arc::new(store);
            (
                Arc::clone(&store) as Arc<dyn ToolDirectory>,
                store as Arc<dyn BookingStore>,
            )
        }
        StorageBackend::Postgres => {
            let store = Arc::new(
                PostgresStore::connect(&config)
                    .await
                    .context("connecting to PostgreSQL")?,
            );
            (
                Arc::clone(&store) as Arc<dyn ToolDirectory>,
                store as Arc<dyn BookingStore>,
            )
        }
    };

    // Build service layer
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let service = BookingService::new(tools, bookings, clock, config.transition_policy);

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(service));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
