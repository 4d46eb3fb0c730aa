//! Gateway configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use presence_core::event::EventFields;
use presence_core::fanout::MONITORED_SOURCE;
use presence_core::sink::{DEFAULT_API_BASE, DEFAULT_SEND_TIMEOUT_MS};
use presence_core::{AlertTimeZone, FanoutConfig, TelegramConfig, ALARM_THRESHOLD};

/// Presence alert gateway command line arguments.
#[derive(Debug, Parser)]
#[command(name = "presence-gateway")]
#[command(about = "Webhook gateway for the presence alert bot")]
pub struct Args {
    /// Address to listen on for HTTP requests.
    #[arg(short, long, env = "PRESENCE_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: String,

    /// Directory of the subscriber database. Subscribers are kept in memory when unset.
    #[arg(short, long, env = "PRESENCE_DATA_PATH")]
    pub data_path: Option<PathBuf>,

    /// Telegram bot token. Outbound messages are only logged when unset.
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_token: Option<String>,

    /// Base URL of the Telegram Bot API.
    #[arg(long, env = "TELEGRAM_API_BASE", default_value = DEFAULT_API_BASE)]
    pub telegram_api_base: String,

    /// Timeout (ms) for each outbound message.
    #[arg(long, default_value_t = DEFAULT_SEND_TIMEOUT_MS)]
    pub send_timeout_ms: u64,

    /// Metric values at or above this trigger an alert.
    #[arg(long, default_value_t = ALARM_THRESHOLD)]
    pub alarm_threshold: u64,

    /// Source tag of the monitored change stream.
    #[arg(long, default_value = MONITORED_SOURCE)]
    pub event_source: String,

    /// Attribute holding the metric in change records.
    #[arg(long, default_value = "presences")]
    pub metric_field: String,

    /// Attribute holding the observation time in change records.
    #[arg(long, default_value = "timestamp")]
    pub timestamp_field: String,

    /// Render alert times at this offset from UTC (minutes) instead of host local time.
    #[arg(long, allow_negative_numbers = true)]
    pub utc_offset_minutes: Option<i32>,
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address to listen on for HTTP requests.
    pub listen_addr: String,
    /// Subscriber database directory; in-memory when `None`.
    pub data_path: Option<PathBuf>,
    /// Telegram sink settings; log-only sink when `None`.
    pub telegram: Option<TelegramConfig>,
    /// Fan-out settings.
    pub fanout: FanoutConfig,
}

impl GatewayConfig {
    /// Build the configuration, rejecting out-of-range values.
    pub fn from_args(args: &Args) -> Result<Self, String> {
        let time_zone = match args.utc_offset_minutes {
            Some(minutes) => AlertTimeZone::from_offset_minutes(minutes)
                .ok_or_else(|| format!("utc offset of {} minutes is out of range", minutes))?,
            None => AlertTimeZone::Local,
        };

        let telegram = args.telegram_token.as_ref().map(|token| {
            TelegramConfig::new(token.clone())
                .with_api_base(args.telegram_api_base.clone())
                .with_timeout(Duration::from_millis(args.send_timeout_ms))
        });

        let fanout = FanoutConfig::default()
            .with_threshold(args.alarm_threshold)
            .with_event_source(args.event_source.clone())
            .with_fields(args.metric_field.clone(), args.timestamp_field.clone())
            .with_time_zone(time_zone);

        Ok(Self {
            listen_addr: args.listen.clone(),
            data_path: args.data_path.clone(),
            telegram,
            fanout,
        })
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            data_path: None,
            telegram: None,
            fanout: FanoutConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["presence-gateway"]).unwrap();
        let config = GatewayConfig::from_args(&args).unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.fanout.threshold, ALARM_THRESHOLD);
        assert_eq!(config.fanout.event_source, "aws:dynamodb");
        assert_eq!(config.fanout.fields, EventFields::default());
        assert_eq!(config.fanout.time_zone, AlertTimeZone::Local);
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "presence-gateway",
            "--telegram-token",
            "123:abc",
            "--alarm-threshold",
            "25",
            "--utc-offset-minutes",
            "-300",
            "--send-timeout-ms",
            "2500",
        ])
        .unwrap();
        let config = GatewayConfig::from_args(&args).unwrap();

        assert_eq!(config.fanout.threshold, 25);
        assert_eq!(
            config.fanout.time_zone,
            AlertTimeZone::from_offset_minutes(-300).unwrap()
        );
        let telegram = config.telegram.unwrap();
        assert_eq!(telegram.token, "123:abc");
        assert_eq!(telegram.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_invalid_offset_rejected() {
        let args =
            Args::try_parse_from(["presence-gateway", "--utc-offset-minutes", "1440"]).unwrap();
        assert!(GatewayConfig::from_args(&args).is_err());
    }
}
