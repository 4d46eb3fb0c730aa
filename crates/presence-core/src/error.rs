//! Error types for the alert bridge.
//!
//! None of these ever reach a trigger caller: the router and the fan-out
//! engine log them and keep going.

use thiserror::Error;

/// Subscriber store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying sled failure.
    #[error("storage error: {0}")]
    Backend(#[from] sled::Error),

    /// Stored value could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A key in the subscriber tree had the wrong width.
    #[error("invalid subscriber key of {0} bytes")]
    InvalidKey(usize),

    /// Store is unreachable or refused the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Outbound message delivery errors.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The request could not be sent or the response could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The chat API answered with a non-success status.
    #[error("chat api returned status {0}")]
    Status(u16),

    /// The request did not complete in time.
    #[error("send timed out")]
    Timeout,
}

impl From<reqwest::Error> for SinkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return SinkError::Timeout;
        }
        // The request URL carries the bot token.
        SinkError::Transport(err.without_url().to_string())
    }
}

/// Errors decoding a change record into a [`crate::ChangeEvent`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EventError {
    /// The batch entry does not have the shape of a change record.
    #[error("undecodable record: {0}")]
    Undecodable(String),

    /// The record has no new-value image.
    #[error("record has no new image")]
    MissingImage,

    /// A required attribute is absent or not numeric-typed.
    #[error("missing numeric attribute '{0}'")]
    MissingField(String),

    /// The attribute is present but not a base-10 integer in range.
    #[error("attribute '{field}' is not a valid integer: {value:?}")]
    InvalidNumber {
        /// Attribute name.
        field: String,
        /// Raw attribute value.
        value: String,
    },

    /// The timestamp cannot be represented as a calendar date.
    #[error("timestamp {0} is out of range")]
    TimestampOutOfRange(i64),
}

/// Errors converting an inbound chat update into an [`crate::InboundMessage`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UpdateError {
    /// The message has no sender (channel posts).
    #[error("message has no sender")]
    MissingSender,

    /// An id field is not an integer.
    #[error("field '{field}' is not a valid id: {value:?}")]
    InvalidId {
        /// Field name.
        field: &'static str,
        /// Raw value.
        value: String,
    },
}
