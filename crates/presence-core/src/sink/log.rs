use async_trait::async_trait;

use super::MessageSink;
use crate::error::SinkError;
use crate::model::DeliveryAddress;

/// Sink that only logs. Used when no chat API token is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl MessageSink for LogSink {
    async fn send(&self, address: &DeliveryAddress, text: &str) -> Result<(), SinkError> {
        tracing::info!(%address, text, "outbound message (no chat transport configured)");
        Ok(())
    }
}
