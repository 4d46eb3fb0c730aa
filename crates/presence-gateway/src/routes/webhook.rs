//! Chat webhook endpoint.

use axum::body::Bytes;
use axum::{extract::State, routing::post, Json, Router};
use presence_core::Update;
use tracing::{debug, warn};

use crate::json::Ack;
use crate::AppState;

/// Webhook routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/webhook", post(handle_update))
}

/// Handle one chat update.
///
/// The body is parsed by hand so that malformed payloads are acknowledged
/// instead of rejected.
async fn handle_update(State(state): State<AppState>, body: Bytes) -> Json<Ack> {
    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "ignoring unparseable update");
            return Json(Ack::default());
        }
    };

    let Some(message) = update.message else {
        debug!(update_id = ?update.update_id, "update has no message");
        return Json(Ack::default());
    };

    match message.into_inbound() {
        Ok(inbound) => {
            let reply = state.router.handle(inbound).await;
            debug!(update_id = ?update.update_id, address = %reply.address, "update handled");
        }
        Err(e) => warn!(update_id = ?update.update_id, error = %e, "ignoring invalid message"),
    }

    Json(Ack::default())
}
