//! JSON response types for the HTTP gateway.

use serde::Serialize;

/// Empty acknowledgement returned by both trigger endpoints.
#[derive(Debug, Default, Serialize)]
pub struct Ack {}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status.
    pub status: String,
    /// Gateway version.
    pub version: String,
    /// Current subscriber count; `None` when the store could not be read.
    pub subscribers: Option<usize>,
}
