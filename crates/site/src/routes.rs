//! HTTP routes.
//!
//! The site is a single document. Everything after the first load happens
//! over the `/live` socket.

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::{Router, routing::get};

use crate::error::AppError;
use crate::live::live_handler;
use crate::pages::ShellTemplate;
use crate::state::AppState;

/// Site name shown in the title and footer.
pub const SITE_NAME: &str = "Cultural Club";

/// Build the router for all site routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shell))
        .route("/live", get(live_handler))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .fallback(not_found)
}

/// The application shell.
#[tracing::instrument]
async fn shell() -> ShellTemplate {
    ShellTemplate {
        site_name: SITE_NAME,
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the backend is not reachable.
#[tracing::instrument(skip_all)]
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.backend_ready().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Anything else. Pages live behind the fragment, not the path.
async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
