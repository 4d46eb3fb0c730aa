//! Presence alert core: chat command routing and change-event fan-out.
//!
//! Two entry points share a [`SubscriberStore`] and a [`MessageSink`]:
//!
//! - [`CommandRouter`] handles `/start` and `/stop` chat commands.
//! - [`FanoutEngine`] turns change-stream insertions at or above a threshold
//!   into alerts broadcast to every subscriber.
//!
//! Both are stateless between calls and take their collaborators by
//! injection.

pub mod error;
pub mod event;
pub mod fanout;
pub mod format;
pub mod model;
pub mod router;
pub mod sink;
pub mod store;
pub mod update;

pub use error::{EventError, SinkError, StoreError, UpdateError};
pub use event::{ChangeBatch, ChangeRecord, EventFields};
pub use fanout::{BroadcastOutcome, FanoutConfig, FanoutEngine, FanoutReport, ALARM_THRESHOLD};
pub use format::AlertTimeZone;
pub use model::{
    ChangeEvent, DeliveryAddress, InboundMessage, MessageEntity, OutboundReply, Subscriber,
    SubscriberId,
};
pub use router::{Command, CommandRouter};
pub use sink::{LogSink, MessageSink, TelegramConfig, TelegramSink};
pub use store::{MemoryStore, ScanPage, SledStore, SledStoreConfig, SubscriberStore};
pub use update::Update;
