//! Status reporting over HTTP.
//!
//! A read-only endpoint serving the health of every registered peer
//! in registration order, as html, json or csv. Reads go through the
//! same engine pointer the traffic path uses, so the page always
//! reflects the live generation.

pub mod handlers;
pub mod report;

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::StatusConfig;
use crate::engine::Engine;

pub use report::{build_report, PeerRow, StatusReport};

/// Shared state for the status handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ArcSwap<Engine>>,
}

pub fn build_router(path: &str, state: AppState) -> Router {
    Router::new()
        .route(path, get(handlers::get_status))
        .layer(TimeoutLayer::new(Duration::from_secs(5)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until shutdown.
pub async fn serve(
    config: &StatusConfig,
    state: AppState,
    shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(&config.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        path = %config.path,
        "status endpoint listening"
    );
    serve_on(listener, &config.path, state, shutdown).await
}

/// Serve on an already-bound listener.
pub async fn serve_on(
    listener: TcpListener,
    path: &str,
    state: AppState,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    let app = build_router(path, state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}
