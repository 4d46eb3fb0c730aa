//! Chat command routing.
//!
//! Turns an inbound chat message into subscription changes and a reply. The
//! router holds no state of its own; every subscription lives in the store.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::format::{greeting, ADDED_REPLY, REMOVED_REPLY};
use crate::model::{InboundMessage, OutboundReply, Subscriber};
use crate::sink::MessageSink;
use crate::store::SubscriberStore;

/// Annotation type marking a command token.
pub const COMMAND_ENTITY: &str = "bot_command";

/// Token that subscribes the sender.
pub const START_COMMAND: &str = "/start";

/// Token that unsubscribes the sender.
pub const STOP_COMMAND: &str = "/stop";

/// A recognized command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Add the sender to the subscriber table.
    Subscribe,
    /// Remove the sender from the subscriber table.
    Unsubscribe,
}

impl Command {
    /// Match a literal command token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            START_COMMAND => Some(Command::Subscribe),
            STOP_COMMAND => Some(Command::Unsubscribe),
            _ => None,
        }
    }

    /// Acknowledgement sent after the command runs.
    pub fn reply(self) -> &'static str {
        match self {
            Command::Subscribe => ADDED_REPLY,
            Command::Unsubscribe => REMOVED_REPLY,
        }
    }
}

/// Recognized commands in annotation order.
pub fn extract_commands(message: &InboundMessage) -> Vec<Command> {
    message
        .entities
        .iter()
        .filter(|entity| entity.kind == COMMAND_ENTITY)
        .filter_map(|entity| slice_utf16(&message.text, entity.offset, entity.length))
        .filter_map(|token| Command::from_token(&token))
        .collect()
}

/// Slice `text` by UTF-16 code units. `None` when the range is out of bounds
/// or cuts a surrogate pair.
fn slice_utf16(text: &str, offset: usize, length: usize) -> Option<String> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let end = offset.checked_add(length)?;
    let slice = units.get(offset..end)?;
    String::from_utf16(slice).ok()
}

/// Routes inbound chat messages.
pub struct CommandRouter {
    store: Arc<dyn SubscriberStore>,
    sink: Arc<dyn MessageSink>,
}

impl CommandRouter {
    /// Create a router over the given store and sink.
    pub fn new(store: Arc<dyn SubscriberStore>, sink: Arc<dyn MessageSink>) -> Self {
        Self { store, sink }
    }

    /// Apply every recognized command in `message`, then reply to its channel.
    ///
    /// Commands run in annotation order and the last one picks the reply.
    /// With no recognized command the reply is the greeting. Store and send
    /// failures are logged, never returned.
    pub async fn handle(&self, message: InboundMessage) -> OutboundReply {
        let commands = extract_commands(&message);
        debug!(
            sender_id = message.sender_id,
            entities = message.entities.len(),
            commands = commands.len(),
            "routing inbound message"
        );

        let mut reply = None;
        for command in commands {
            self.apply(command, &message).await;
            reply = Some(command.reply().to_string());
        }

        let reply = OutboundReply {
            address: message.channel_id.clone(),
            text: reply.unwrap_or_else(|| greeting(&message.sender_name)),
        };

        if let Err(e) = self.sink.send(&reply.address, &reply.text).await {
            warn!(address = %reply.address, error = %e, "failed to send reply");
        }

        reply
    }

    async fn apply(&self, command: Command, message: &InboundMessage) {
        let sender_id = message.sender_id;
        match command {
            Command::Subscribe => {
                let subscriber = Subscriber::new(sender_id, message.channel_id.clone());
                match self.store.put(subscriber).await {
                    Ok(()) => info!(sender_id, channel = %message.channel_id, "subscriber added"),
                    Err(e) => warn!(sender_id, error = %e, "failed to add subscriber"),
                }
            }
            Command::Unsubscribe => match self.store.delete(sender_id).await {
                Ok(()) => info!(sender_id, "subscriber removed"),
                Err(e) => warn!(sender_id, error = %e, "failed to remove subscriber"),
            },
        }
    }
}
