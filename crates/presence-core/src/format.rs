//! User-facing message text.

use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Utc};

use crate::error::EventError;
use crate::model::ChangeEvent;

/// Reply after a successful `/start`.
pub const ADDED_REPLY: &str = "Added";

/// Reply after a successful `/stop`.
pub const REMOVED_REPLY: &str = "Removed";

/// Display names longer than this are cut.
pub const MAX_DISPLAY_NAME_CHARS: usize = 64;

/// Used in the greeting when the sender has no usable name.
pub const FALLBACK_DISPLAY_NAME: &str = "there";

const DATETIME_FORMAT: &str = "%Y/%m/%d %H:%M";

/// Time zone used to render alert timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertTimeZone {
    /// The host's local time zone.
    #[default]
    Local,
    /// A fixed offset from UTC.
    Fixed(FixedOffset),
}

impl AlertTimeZone {
    /// UTC.
    pub fn utc() -> Self {
        AlertTimeZone::Fixed(Utc.fix())
    }

    /// A fixed offset given in minutes east of UTC. `None` if out of range.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(AlertTimeZone::Fixed)
    }

    /// Render epoch seconds as `YYYY/MM/DD HH:MM`.
    pub fn format_timestamp(&self, epoch_secs: i64) -> Option<String> {
        match self {
            AlertTimeZone::Local => format_datetime(epoch_secs, &Local),
            AlertTimeZone::Fixed(offset) => format_datetime(epoch_secs, offset),
        }
    }
}

/// Render epoch seconds in `tz` as `YYYY/MM/DD HH:MM`.
///
/// Month, day, hour and minute are zero-padded to two digits. Returns `None`
/// when the timestamp is outside chrono's representable range.
pub fn format_datetime<Tz: TimeZone>(epoch_secs: i64, tz: &Tz) -> Option<String>
where
    Tz::Offset: std::fmt::Display,
{
    let utc: DateTime<Utc> = DateTime::from_timestamp(epoch_secs, 0)?;
    Some(utc.with_timezone(tz).format(DATETIME_FORMAT).to_string())
}

/// Text broadcast to every subscriber for a triggering event.
pub fn alert_text(event: &ChangeEvent, tz: &AlertTimeZone) -> Result<String, EventError> {
    let when = tz
        .format_timestamp(event.observed_at)
        .ok_or(EventError::TimestampOutOfRange(event.observed_at))?;
    Ok(format!(
        "There are {} presences on {}",
        event.metric_value, when
    ))
}

/// Help text sent when a message carries no recognized command.
pub fn greeting(display_name: &str) -> String {
    format!(
        "Hi {}! You can use\n/start to receive alerts\n/stop to stop receiving them",
        sanitize_display_name(display_name)
    )
}

/// Make an untrusted display name safe to echo back.
///
/// Control characters are dropped and the result is trimmed to at most
/// [`MAX_DISPLAY_NAME_CHARS`] characters.
pub fn sanitize_display_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_DISPLAY_NAME_CHARS)
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        FALLBACK_DISPLAY_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}
