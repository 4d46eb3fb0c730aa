//! Outbound message delivery.

mod log;
mod telegram;

pub use log::LogSink;
pub use telegram::{TelegramConfig, TelegramSink, DEFAULT_API_BASE, DEFAULT_SEND_TIMEOUT_MS};

use async_trait::async_trait;

use crate::error::SinkError;
use crate::model::DeliveryAddress;

/// Delivers text to a recipient.
///
/// Each call is a single attempt; callers log failures and never retry.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Send `text` to `address`.
    async fn send(&self, address: &DeliveryAddress, text: &str) -> Result<(), SinkError>;
}
