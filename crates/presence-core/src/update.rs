//! Chat webhook payloads.
//!
//! Mirrors the subset of the Telegram Bot API `Update` object the router
//! needs. Unknown fields are ignored.

use serde::Deserialize;

use crate::error::UpdateError;
use crate::model::{DeliveryAddress, InboundMessage, MessageEntity, SubscriberId};

/// A webhook delivery.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Update {
    /// Monotonic update id assigned by the chat platform.
    #[serde(default)]
    pub update_id: Option<i64>,
    /// Present for new incoming messages only.
    #[serde(default)]
    pub message: Option<Message>,
}

/// A chat message as delivered by the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Sender; absent for channel posts.
    #[serde(default)]
    pub from: Option<User>,
    /// Originating chat.
    pub chat: Chat,
    /// Message text.
    #[serde(default)]
    pub text: Option<String>,
    /// Annotations over `text`.
    #[serde(default)]
    pub entities: Vec<Entity>,
}

/// Message sender.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// User id.
    pub id: RawId,
    /// Display name.
    #[serde(default)]
    pub first_name: Option<String>,
}

/// Originating chat.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Chat id.
    pub id: RawId,
}

/// Text annotation.
#[derive(Debug, Clone, Deserialize)]
pub struct Entity {
    /// Annotation type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Start, in UTF-16 code units.
    pub offset: usize,
    /// Length, in UTF-16 code units.
    pub length: usize,
}

/// An id as it arrives on the wire: a number, or a string that should hold one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    /// JSON number.
    Number(i64),
    /// JSON string.
    Text(String),
}

impl RawId {
    fn parse(&self, field: &'static str) -> Result<i64, UpdateError> {
        match self {
            RawId::Number(id) => Ok(*id),
            RawId::Text(raw) => raw.trim().parse().map_err(|_| UpdateError::InvalidId {
                field,
                value: raw.clone(),
            }),
        }
    }
}

impl Message {
    /// Validate ids and convert into the router's input.
    pub fn into_inbound(self) -> Result<InboundMessage, UpdateError> {
        let from = self.from.ok_or(UpdateError::MissingSender)?;
        let sender_id: SubscriberId = from.id.parse("from.id")?;
        let chat_id = self.chat.id.parse("chat.id")?;

        Ok(InboundMessage {
            sender_id,
            sender_name: from.first_name.unwrap_or_default(),
            channel_id: DeliveryAddress::Chat(chat_id),
            text: self.text.unwrap_or_default(),
            entities: self
                .entities
                .into_iter()
                .map(|e| MessageEntity::new(e.kind, e.offset, e.length))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_command_update() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 455422569,
            "message": {
                "message_id": 83,
                "from": {"id": 1234, "first_name": "Ann", "is_bot": false},
                "chat": {"id": 5678, "type": "private"},
                "date": 1476266846,
                "text": "/start",
                "entities": [{"type": "bot_command", "offset": 0, "length": 6}]
            }
        }))
        .unwrap();

        let inbound = update.message.unwrap().into_inbound().unwrap();
        assert_eq!(inbound.sender_id, 1234);
        assert_eq!(inbound.sender_name, "Ann");
        assert_eq!(inbound.channel_id, DeliveryAddress::Chat(5678));
        assert_eq!(inbound.entities, vec![MessageEntity::new("bot_command", 0, 6)]);
    }

    #[test]
    fn test_update_without_message() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 1,
            "edited_message": {"chat": {"id": 1}}
        }))
        .unwrap();
        assert!(update.message.is_none());
    }

    #[test]
    fn test_numeric_string_ids_accepted() {
        let message: Message = serde_json::from_value(json!({
            "from": {"id": "42"},
            "chat": {"id": " 43 "}
        }))
        .unwrap();

        let inbound = message.into_inbound().unwrap();
        assert_eq!(inbound.sender_id, 42);
        assert_eq!(inbound.channel_id, DeliveryAddress::Chat(43));
        assert_eq!(inbound.sender_name, "");
        assert_eq!(inbound.text, "");
    }

    #[test]
    fn test_invalid_ids_rejected() {
        let message: Message = serde_json::from_value(json!({
            "from": {"id": "42; DROP TABLE"},
            "chat": {"id": 1}
        }))
        .unwrap();
        assert_eq!(
            message.into_inbound(),
            Err(UpdateError::InvalidId {
                field: "from.id",
                value: "42; DROP TABLE".to_string(),
            })
        );

        let anonymous: Message = serde_json::from_value(json!({"chat": {"id": 1}})).unwrap();
        assert_eq!(anonymous.into_inbound(), Err(UpdateError::MissingSender));
    }
}
