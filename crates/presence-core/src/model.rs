//! Domain types shared by the router and the fan-out engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a subscribing end user.
pub type SubscriberId = i64;

/// Channel-specific destination for outbound text.
///
/// Chat platforms address private chats by number and public channels by
/// handle, so both forms are accepted. Serializes untagged, which is what the
/// chat API expects for `chat_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeliveryAddress {
    /// Numeric chat id.
    Chat(i64),
    /// Channel handle such as `@alerts`.
    Handle(String),
}

impl From<i64> for DeliveryAddress {
    fn from(id: i64) -> Self {
        DeliveryAddress::Chat(id)
    }
}

impl From<&str> for DeliveryAddress {
    fn from(handle: &str) -> Self {
        DeliveryAddress::Handle(handle.to_string())
    }
}

impl fmt::Display for DeliveryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryAddress::Chat(id) => write!(f, "{}", id),
            DeliveryAddress::Handle(handle) => f.write_str(handle),
        }
    }
}

/// A stored subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    /// Primary key.
    pub subscriber_id: SubscriberId,
    /// Where alerts for this subscriber are sent.
    pub delivery_address: DeliveryAddress,
}

impl Subscriber {
    /// Create a subscriber record.
    pub fn new(subscriber_id: SubscriberId, delivery_address: impl Into<DeliveryAddress>) -> Self {
        Self {
            subscriber_id,
            delivery_address: delivery_address.into(),
        }
    }
}

/// Location of a recognized token inside a message's text.
///
/// Offsets and lengths are in UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEntity {
    /// Annotation type, e.g. `bot_command`.
    pub kind: String,
    /// Start of the token.
    pub offset: usize,
    /// Length of the token.
    pub length: usize,
}

impl MessageEntity {
    /// Create an annotation.
    pub fn new(kind: impl Into<String>, offset: usize, length: usize) -> Self {
        Self {
            kind: kind.into(),
            offset,
            length,
        }
    }
}

/// A chat message addressed to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Who sent it.
    pub sender_id: SubscriberId,
    /// Sender display name, untrusted.
    pub sender_name: String,
    /// Where it came from; replies and alerts go back here.
    pub channel_id: DeliveryAddress,
    /// Free-form text, empty when the message had none.
    pub text: String,
    /// Annotations in message order.
    pub entities: Vec<MessageEntity>,
}

impl InboundMessage {
    /// Create a message with no text.
    pub fn new(
        sender_id: SubscriberId,
        sender_name: impl Into<String>,
        channel_id: impl Into<DeliveryAddress>,
    ) -> Self {
        Self {
            sender_id,
            sender_name: sender_name.into(),
            channel_id: channel_id.into(),
            text: String::new(),
            entities: Vec::new(),
        }
    }

    /// Append plain text.
    pub fn with_text(mut self, text: &str) -> Self {
        self.text.push_str(text);
        self
    }

    /// Append a command token together with its `bot_command` annotation.
    pub fn with_command(mut self, token: &str) -> Self {
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        let offset = self.text.encode_utf16().count();
        let length = token.encode_utf16().count();
        self.text.push_str(token);
        self.entities
            .push(MessageEntity::new(crate::router::COMMAND_ENTITY, offset, length));
        self
    }
}

/// A reply or alert: one text for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReply {
    /// Recipient.
    pub address: DeliveryAddress,
    /// Message body.
    pub text: String,
}

/// A newly inserted data point from the monitored source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Observed count.
    pub metric_value: u64,
    /// Observation time, epoch seconds.
    pub observed_at: i64,
}
