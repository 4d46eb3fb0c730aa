//! Presence alert HTTP gateway.
//!
//! Exposes the two triggers of the alert core over HTTP: the chat webhook and
//! the change-stream batch endpoint. Both always acknowledge with `200 {}`.

pub mod config;
pub mod json;
pub mod routes;

pub use config::{Args, GatewayConfig};

use std::sync::Arc;

use axum::Router;
use presence_core::{CommandRouter, FanoutEngine, FanoutConfig, MessageSink, SubscriberStore};
use tower_http::trace::TraceLayer;

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Chat command router.
    pub router: Arc<CommandRouter>,
    /// Change-event fan-out engine.
    pub fanout: Arc<FanoutEngine>,
    /// Subscriber store, for health reporting.
    pub store: Arc<dyn SubscriberStore>,
}

impl AppState {
    /// Wire the router and the fan-out engine to a shared store and sink.
    pub fn new(
        store: Arc<dyn SubscriberStore>,
        sink: Arc<dyn MessageSink>,
        fanout: FanoutConfig,
    ) -> Self {
        Self {
            router: Arc::new(CommandRouter::new(store.clone(), sink.clone())),
            fanout: Arc::new(FanoutEngine::new(store.clone(), sink, fanout)),
            store,
        }
    }
}

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(routes::webhook::routes())
        .merge(routes::events::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
