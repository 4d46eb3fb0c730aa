//! Change-event fan-out.
//!
//! Reads a batch of change records, picks the insertions from the monitored
//! source, and broadcasts an alert to every subscriber for each insertion
//! whose metric reaches the threshold.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::event::{ChangeBatch, EventFields};
use crate::format::{alert_text, AlertTimeZone};
use crate::sink::MessageSink;
use crate::store::SubscriberStore;

/// Default alert threshold, inclusive.
pub const ALARM_THRESHOLD: u64 = 10;

/// Default source tag of the monitored change stream.
pub const MONITORED_SOURCE: &str = "aws:dynamodb";

/// Fan-out configuration.
#[derive(Debug, Clone)]
pub struct FanoutConfig {
    /// Metric values at or above this trigger a broadcast.
    pub threshold: u64,
    /// Only records with this source tag are considered.
    pub event_source: String,
    /// Attribute names in the record image.
    pub fields: EventFields,
    /// Time zone for alert timestamps.
    pub time_zone: AlertTimeZone,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            threshold: ALARM_THRESHOLD,
            event_source: MONITORED_SOURCE.to_string(),
            fields: EventFields::default(),
            time_zone: AlertTimeZone::Local,
        }
    }
}

impl FanoutConfig {
    /// Set the threshold.
    pub fn with_threshold(mut self, threshold: u64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the monitored source tag.
    pub fn with_event_source(mut self, source: impl Into<String>) -> Self {
        self.event_source = source.into();
        self
    }

    /// Set the metric and timestamp attribute names.
    pub fn with_fields(mut self, metric: impl Into<String>, timestamp: impl Into<String>) -> Self {
        self.fields = EventFields {
            metric: metric.into(),
            timestamp: timestamp.into(),
        };
        self
    }

    /// Set the time zone for alert timestamps.
    pub fn with_time_zone(mut self, time_zone: AlertTimeZone) -> Self {
        self.time_zone = time_zone;
        self
    }
}

/// Result of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Subscribers found by the scan.
    pub recipients: usize,
    /// Sends that succeeded.
    pub delivered: usize,
    /// Sends that failed.
    pub failed: usize,
}

/// Acknowledgement for a processed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    /// Entries in the batch.
    pub records: usize,
    /// Insertions from the monitored source.
    pub eligible: usize,
    /// Entries that could not be decoded, plus eligible records whose
    /// attributes could not be read.
    pub malformed: usize,
    /// Events at or above the threshold, one broadcast each.
    pub triggered: usize,
    /// Successful sends across all broadcasts.
    pub delivered: usize,
    /// Failed sends across all broadcasts.
    pub failed: usize,
}

/// Broadcasts threshold alerts to all subscribers.
pub struct FanoutEngine {
    store: Arc<dyn SubscriberStore>,
    sink: Arc<dyn MessageSink>,
    config: FanoutConfig,
}

impl FanoutEngine {
    /// Create an engine over the given store and sink.
    pub fn new(
        store: Arc<dyn SubscriberStore>,
        sink: Arc<dyn MessageSink>,
        config: FanoutConfig,
    ) -> Self {
        Self {
            store,
            sink,
            config,
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &FanoutConfig {
        &self.config
    }

    /// Process a batch in record order.
    ///
    /// Each triggering record gets its own broadcast against a fresh
    /// subscriber scan. Undecodable records are skipped. All sends have been
    /// attempted when this returns.
    pub async fn handle(&self, batch: &ChangeBatch) -> FanoutReport {
        let mut report = FanoutReport {
            records: batch.len(),
            malformed: batch.rejected.len(),
            ..Default::default()
        };

        for error in &batch.rejected {
            warn!(error = %error, "malformed change record");
        }

        for record in &batch.records {
            if !record.is_insert_from(&self.config.event_source) {
                debug!(
                    event_id = ?record.event_id,
                    source = %record.event_source,
                    name = %record.event_name,
                    "skipping record"
                );
                continue;
            }
            report.eligible += 1;

            let event = match record.change_event(&self.config.fields) {
                Ok(event) => event,
                Err(e) => {
                    warn!(event_id = ?record.event_id, error = %e, "malformed change record");
                    report.malformed += 1;
                    continue;
                }
            };

            if event.metric_value < self.config.threshold {
                debug!(
                    metric = event.metric_value,
                    threshold = self.config.threshold,
                    "below threshold"
                );
                continue;
            }

            let text = match alert_text(&event, &self.config.time_zone) {
                Ok(text) => text,
                Err(e) => {
                    warn!(event_id = ?record.event_id, error = %e, "malformed change record");
                    report.malformed += 1;
                    continue;
                }
            };

            report.triggered += 1;
            let outcome = self.broadcast(&text).await;
            report.delivered += outcome.delivered;
            report.failed += outcome.failed;
        }

        info!(
            records = report.records,
            eligible = report.eligible,
            malformed = report.malformed,
            triggered = report.triggered,
            delivered = report.delivered,
            failed = report.failed,
            "change batch processed"
        );
        report
    }

    /// Send `text` to every current subscriber.
    ///
    /// Sends run concurrently and independently; one failure does not stop
    /// the rest. A failed scan delivers nothing.
    pub async fn broadcast(&self, text: &str) -> BroadcastOutcome {
        let subscribers = match self.store.scan_all().await {
            Ok(subscribers) => subscribers,
            Err(e) => {
                warn!(error = %e, "failed to load subscribers, alert dropped");
                return BroadcastOutcome::default();
            }
        };

        let sends = subscribers.iter().map(|subscriber| async move {
            let address = &subscriber.delivery_address;
            match self.sink.send(address, text).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(
                        subscriber_id = subscriber.subscriber_id,
                        %address,
                        error = %e,
                        "failed to deliver alert"
                    );
                    false
                }
            }
        });
        let results = join_all(sends).await;

        let delivered = results.iter().filter(|&&ok| ok).count();
        BroadcastOutcome {
            recipients: subscribers.len(),
            delivered,
            failed: results.len() - delivered,
        }
    }
}
