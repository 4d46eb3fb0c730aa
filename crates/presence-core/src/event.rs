//! Change-stream batch payloads.
//!
//! The shape follows DynamoDB Streams: each record has a source tag, an event
//! name and a `NewImage` of typed attribute values such as `{"N": "13"}`.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::EventError;
use crate::model::ChangeEvent;

/// Event name of an insertion.
pub const INSERT_EVENT: &str = "INSERT";

/// A batch of change records, in stream order.
///
/// Each entry is decoded on its own: an entry that does not fit
/// [`ChangeRecord`] lands in `rejected` and the remaining records are kept.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawBatch")]
pub struct ChangeBatch {
    /// Records that decoded.
    pub records: Vec<ChangeRecord>,
    /// Entries that did not decode as a record.
    pub rejected: Vec<EventError>,
}

#[derive(Deserialize)]
struct RawBatch {
    #[serde(rename = "Records", default)]
    records: Vec<serde_json::Value>,
}

impl From<RawBatch> for ChangeBatch {
    fn from(raw: RawBatch) -> Self {
        let mut batch = ChangeBatch::default();
        for entry in raw.records {
            match serde_json::from_value::<ChangeRecord>(entry) {
                Ok(record) => batch.records.push(record),
                Err(e) => batch.rejected.push(EventError::Undecodable(e.to_string())),
            }
        }
        batch
    }
}

impl ChangeBatch {
    /// A batch of already decoded records.
    pub fn new(records: Vec<ChangeRecord>) -> Self {
        Self {
            records,
            rejected: Vec::new(),
        }
    }

    /// Entries in the batch, decoded or not.
    pub fn len(&self) -> usize {
        self.records.len() + self.rejected.len()
    }

    /// Whether the batch has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One stream record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeRecord {
    /// Record id, used only for logging.
    #[serde(rename = "eventID", default)]
    pub event_id: Option<String>,
    /// Source tag, e.g. `aws:dynamodb`.
    #[serde(rename = "eventSource", default)]
    pub event_source: String,
    /// `INSERT`, `MODIFY` or `REMOVE`.
    #[serde(rename = "eventName", default)]
    pub event_name: String,
    /// Item images.
    #[serde(default)]
    pub dynamodb: Option<StreamImage>,
}

/// Item images attached to a record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamImage {
    /// Item after the change.
    #[serde(rename = "NewImage", default)]
    pub new_image: Option<HashMap<String, AttributeValue>>,
}

/// A typed attribute value. Only numbers are read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttributeValue {
    /// Number, carried as a decimal string.
    #[serde(rename = "N", default)]
    pub n: Option<String>,
}

impl AttributeValue {
    /// A number attribute.
    pub fn number(value: impl ToString) -> Self {
        Self {
            n: Some(value.to_string()),
        }
    }
}

/// Attribute names holding the metric and the observation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFields {
    /// Metric attribute.
    pub metric: String,
    /// Timestamp attribute.
    pub timestamp: String,
}

impl Default for EventFields {
    fn default() -> Self {
        Self {
            metric: "presences".to_string(),
            timestamp: "timestamp".to_string(),
        }
    }
}

impl ChangeRecord {
    /// Build an insert record from `source` carrying the given attributes.
    pub fn insert(source: &str, fields: &EventFields, metric: u64, observed_at: i64) -> Self {
        let image = HashMap::from([
            (fields.metric.clone(), AttributeValue::number(metric)),
            (fields.timestamp.clone(), AttributeValue::number(observed_at)),
        ]);
        Self {
            event_id: None,
            event_source: source.to_string(),
            event_name: INSERT_EVENT.to_string(),
            dynamodb: Some(StreamImage {
                new_image: Some(image),
            }),
        }
    }

    /// True for insertions coming from `source`.
    pub fn is_insert_from(&self, source: &str) -> bool {
        self.event_source == source && self.event_name == INSERT_EVENT
    }

    /// Decode the metric and timestamp from the new image.
    pub fn change_event(&self, fields: &EventFields) -> Result<ChangeEvent, EventError> {
        let image = self
            .dynamodb
            .as_ref()
            .and_then(|d| d.new_image.as_ref())
            .ok_or(EventError::MissingImage)?;

        Ok(ChangeEvent {
            metric_value: number_attribute(image, &fields.metric)?,
            observed_at: number_attribute(image, &fields.timestamp)?,
        })
    }
}

fn number_attribute<T: std::str::FromStr>(
    image: &HashMap<String, AttributeValue>,
    field: &str,
) -> Result<T, EventError> {
    let raw = image
        .get(field)
        .and_then(|value| value.n.as_deref())
        .ok_or_else(|| EventError::MissingField(field.to_string()))?;

    raw.trim().parse().map_err(|_| EventError::InvalidNumber {
        field: field.to_string(),
        value: raw.to_string(),
    })
}
