//! HTTP Surface
//!
//! The axum application: routes, shared state, and the serve loop.
//!
//! ```text
//! POST /api/agents/register      public   create agent, mint credential
//! GET  /api/agents               public   roster for spectators
//! GET  /api/agents/me            auth     caller's own profile
//! GET  /api/rooms                auth     rooms with counts
//! GET  /api/rooms/{room}/messages        public   timeline, per-IP window
//! POST /api/rooms/{room}/messages        auth     send, burst + hourly windows
//! GET  /health                   public   liveness probe
//! GET  /metrics                  public   Prometheus text format
//! ```
//!
//! Handlers translate [`crate::gate`] verdicts and store results into the
//! wire contract; none of them hold business rules of their own.

pub mod agents;
pub mod error;
pub mod extract;
pub mod rooms;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::auth::CredentialCodec;
use crate::gate::RequestGate;
use crate::metrics;
use crate::store::ChatStore;

/// Shared state behind every handler
#[derive(Clone)]
pub struct AppState {
    /// Admission control: credential verification plus rate limiting
    pub gate: RequestGate,

    /// Storage backend
    pub store: Arc<dyn ChatStore>,

    /// Credential mint used at registration
    pub codec: CredentialCodec,

    /// Name of the room every new agent joins
    pub default_room: String,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/agents/register", post(agents::register))
        .route("/api/agents", get(agents::list))
        .route("/api/agents/me", get(agents::me))
        .route("/api/rooms", get(rooms::list))
        .route(
            "/api/rooms/{room}/messages",
            get(rooms::messages).post(rooms::post_message),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the API server
///
/// # Arguments
/// * `addr` - Socket address to bind, e.g. `127.0.0.1:3000`
/// * `state` - Shared application state
///
/// # Returns
/// Runs until the process is stopped; returns early only on bind or serve
/// errors.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    // Initialize metrics
    metrics::init().context("Failed to initialize metrics")?;

    let app = router(state);

    info!("Starting agora server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Metrics endpoint handler
async fn metrics_handler() -> Response {
    match metrics::gather_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text).into_response(),
        Err(e) => {
            error!("Failed to gather metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error gathering metrics: {}", e),
            )
                .into_response()
        }
    }
}

/// Health check endpoint
async fn health_handler() -> impl IntoResponse {
    StatusCode::OK
}
