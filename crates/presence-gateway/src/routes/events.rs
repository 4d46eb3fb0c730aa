//! Change-stream trigger endpoint.

use axum::body::Bytes;
use axum::{extract::State, routing::post, Json, Router};
use presence_core::ChangeBatch;
use tracing::warn;

use crate::json::Ack;
use crate::AppState;

/// Change event routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/change-events", post(handle_batch))
}

/// Handle a batch of change records. Responds after every alert send has
/// been attempted.
async fn handle_batch(State(state): State<AppState>, body: Bytes) -> Json<Ack> {
    let batch: ChangeBatch = match serde_json::from_slice(&body) {
        Ok(batch) => batch,
        Err(e) => {
            warn!(error = %e, "ignoring unparseable change batch");
            return Json(Ack::default());
        }
    };

    state.fanout.handle(&batch).await;
    Json(Ack::default())
}
