//! Telegram Bot API sink.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::MessageSink;
use crate::error::SinkError;
use crate::model::DeliveryAddress;

/// Default Bot API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Default per-request timeout in milliseconds.
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 10_000;

/// Configuration for [`TelegramSink`].
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token.
    pub token: String,
    /// Scheme and host of the Bot API.
    pub api_base: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl TelegramConfig {
    /// Create a configuration for the public Bot API.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS),
        }
    }

    /// Point at a different API base, e.g. a local Bot API server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full `sendMessage` URL. Contains the token.
    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.token
        )
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a DeliveryAddress,
    text: &'a str,
}

/// Sends messages with the Bot API `sendMessage` method.
#[derive(Clone)]
pub struct TelegramSink {
    client: reqwest::Client,
    url: String,
}

impl fmt::Debug for TelegramSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramSink")
            .field("url", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl TelegramSink {
    /// Build a sink with its own HTTP client.
    pub fn new(config: TelegramConfig) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            url: config.send_message_url(),
        })
    }
}

#[async_trait]
impl MessageSink for TelegramSink {
    async fn send(&self, address: &DeliveryAddress, text: &str) -> Result<(), SinkError> {
        let body = SendMessage {
            chat_id: address,
            text,
        };

        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status(status.as_u16()));
        }

        tracing::debug!(%address, status = status.as_u16(), "message delivered");
        Ok(())
    }
}
