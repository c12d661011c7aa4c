use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::guard;
use crate::errors::{BridgeError, Result};

/// Queue URLs ending with this suffix are FIFO queues.
pub const FIFO_SUFFIX: &str = ".fifo";

/// Source partition key holding the queue URL.
pub const QUEUE_URL_KEY: &str = "sqs.queue.url";
/// Source offset key holding the message id.
pub const MESSAGE_ID_KEY: &str = "sqs.message.id";
/// Source offset key holding the receipt handle needed to delete the message.
pub const RECEIPT_HANDLE_KEY: &str = "sqs.message.receipt-handle";

#[must_use]
pub fn is_fifo(url: &str) -> bool {
    url.ends_with(FIFO_SUFFIX)
}

/// A validated queue location. FIFO-ness is derived from the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEndpoint {
    url: String,
    region: String,
    fifo: bool,
}

impl QueueEndpoint {
    /// # Errors
    ///
    /// Returns a validation error if the URL is not absolute or the region is blank.
    pub fn new(url: impl Into<String>, region: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let region = region.into();
        guard::verify_valid_url(&url)?;
        guard::verify_not_blank(Some(&region), "region")?;
        let fifo = is_fifo(&url);
        Ok(Self { url, region, fifo })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    #[must_use]
    pub fn is_fifo(&self) -> bool {
        self.fifo
    }
}

/// Payload of a message attribute, one variant per wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributePayload {
    String(String),
    Binary(Vec<u8>),
    StringList(Vec<String>),
    BinaryList(Vec<Vec<u8>>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub data_type: String,
    pub payload: AttributePayload,
}

impl AttributeValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            data_type: "String".to_string(),
            payload: AttributePayload::String(value.into()),
        }
    }

    pub fn number(value: impl Into<String>) -> Self {
        Self {
            data_type: "Number".to_string(),
            payload: AttributePayload::String(value.into()),
        }
    }

    pub fn binary(value: impl Into<Vec<u8>>) -> Self {
        Self {
            data_type: "Binary".to_string(),
            payload: AttributePayload::Binary(value.into()),
        }
    }

    /// `String` and custom `String.<label>` types count as string-typed.
    #[must_use]
    pub fn is_string_typed(&self) -> bool {
        self.data_type == "String" || self.data_type.starts_with("String.")
    }

    /// The string value, only for string-typed attributes.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.payload {
            AttributePayload::String(value) if self.is_string_typed() => Some(value),
            _ => None,
        }
    }
}

/// A message as delivered by the queue. Never mutated after receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub id: String,
    pub body: String,
    pub receipt_handle: String,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl QueueMessage {
    #[must_use]
    pub fn string_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(AttributeValue::as_str)
    }

    pub fn string_attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .filter_map(|(name, value)| value.as_str().map(|v| (name.as_str(), v)))
    }
}

/// Everything needed to acknowledge the queue message a record came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    pub queue_url: String,
    pub message_id: String,
    pub receipt_handle: String,
}

impl SourcePosition {
    #[must_use]
    pub fn source_partition(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(QUEUE_URL_KEY.to_string(), self.queue_url.clone())])
    }

    #[must_use]
    pub fn source_offset(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (MESSAGE_ID_KEY.to_string(), self.message_id.clone()),
            (RECEIPT_HANDLE_KEY.to_string(), self.receipt_handle.clone()),
        ])
    }

    /// Rebuilds a position from persisted partition and offset maps.
    ///
    /// # Errors
    ///
    /// Returns an illegal-argument error if any of the three keys is missing.
    pub fn from_maps(
        partition: &BTreeMap<String, String>,
        offset: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let field = |map: &BTreeMap<String, String>, key: &str| {
            map.get(key).cloned().ok_or_else(|| {
                BridgeError::IllegalArgument(format!("source position is missing '{key}'"))
            })
        };
        Ok(Self {
            queue_url: field(partition, QUEUE_URL_KEY)?,
            message_id: field(offset, MESSAGE_ID_KEY)?,
            receipt_handle: field(offset, RECEIPT_HANDLE_KEY)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    Bytes(Vec<u8>),
}

impl HeaderValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::String(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: HeaderValue,
}

impl Header {
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: HeaderValue::String(value.into()),
        }
    }
}

/// A record produced by the source bridge for the log writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub topic: String,
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub position: Option<SourcePosition>,
}

impl LogRecord {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers
            .iter()
            .find(|header| header.name == name)
            .map(|header| &header.value)
    }
}

/// A record read from the log and handed to the sink bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub headers: Vec<Header>,
}

impl SinkRecord {
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            key: None,
            value: None,
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: HeaderValue) -> Self {
        self.headers.push(Header {
            name: name.into(),
            value,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_is_derived_from_url_suffix() {
        let standard =
            QueueEndpoint::new("https://sqs.us-east-1.amazonaws.com/123/orders", "us-east-1")
                .unwrap();
        let fifo =
            QueueEndpoint::new("https://sqs.us-east-1.amazonaws.com/123/orders.fifo", "us-east-1")
                .unwrap();
        assert!(!standard.is_fifo());
        assert!(fifo.is_fifo());
    }

    #[test]
    fn endpoint_requires_region() {
        let err = QueueEndpoint::new("https://sqs.us-east-1.amazonaws.com/123/q", " ").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn only_string_typed_attributes_expose_values() {
        let mut custom = AttributeValue::string("v");
        custom.data_type = "String.uuid".to_string();
        assert_eq!(custom.as_str(), Some("v"));
        assert_eq!(AttributeValue::number("42").as_str(), None);
        assert_eq!(AttributeValue::binary(vec![1, 2]).as_str(), None);
    }

    #[test]
    fn position_round_trips_through_offset_maps() {
        let position = SourcePosition {
            queue_url: "https://sqs.us-east-1.amazonaws.com/123/q".to_string(),
            message_id: "m-1".to_string(),
            receipt_handle: "rh-1".to_string(),
        };
        let rebuilt =
            SourcePosition::from_maps(&position.source_partition(), &position.source_offset())
                .unwrap();
        assert_eq!(rebuilt, position);

        let err = SourcePosition::from_maps(&position.source_partition(), &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, BridgeError::IllegalArgument(_)));
    }

    #[test]
    fn sink_record_deserializes_typed_headers() {
        let json = r#"{"topic":"orders","partition":2,"offset":57,"value":"{}",
            "headers":[{"name":"trace","value":"abc"},{"name":"retries","value":3}]}"#;
        let record: SinkRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.headers[0].value.as_str(), Some("abc"));
        assert_eq!(record.headers[1].value, HeaderValue::Integer(3));
        assert!(record.key.is_none());
    }
}
