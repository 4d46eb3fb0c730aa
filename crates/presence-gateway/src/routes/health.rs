//! Health check endpoint.

use axum::{extract::State, routing::get, Json, Router};
use presence_core::SubscriberStore;

use crate::json::HealthResponse;
use crate::AppState;

/// Health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let subscribers = match state.store.scan_all().await {
        Ok(all) => Some(all.len()),
        Err(e) => {
            tracing::warn!(error = %e, "health check could not read subscribers");
            None
        }
    };

    Json(HealthResponse {
        status: if subscribers.is_some() { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        subscribers,
    })
}
