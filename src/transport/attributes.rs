//! Conversion between [`AttributeValue`] and the SQS wire types.

use aws_sdk_sqs::primitives::Blob;
use aws_sdk_sqs::types::{Message, MessageAttributeValue};
use std::collections::BTreeMap;
use tracing::warn;

use crate::core::models::{AttributePayload, AttributeValue, QueueMessage};
use crate::errors::{BridgeError, Result};

/// The data type is always carried; payloads only when non-empty.
///
/// # Errors
///
/// Returns a validation error if the SDK rejects the attribute.
pub fn to_wire(value: &AttributeValue) -> Result<MessageAttributeValue> {
    let builder = MessageAttributeValue::builder().data_type(&value.data_type);
    let builder = match &value.payload {
        AttributePayload::String(s) if !s.is_empty() => builder.string_value(s),
        AttributePayload::Binary(bytes) if !bytes.is_empty() => {
            builder.binary_value(Blob::new(bytes.clone()))
        }
        AttributePayload::StringList(values) if !values.is_empty() => {
            builder.set_string_list_values(Some(values.clone()))
        }
        AttributePayload::BinaryList(values) if !values.is_empty() => builder
            .set_binary_list_values(Some(values.iter().cloned().map(Blob::new).collect())),
        AttributePayload::String(_)
        | AttributePayload::Binary(_)
        | AttributePayload::StringList(_)
        | AttributePayload::BinaryList(_) => builder,
    };
    builder
        .build()
        .map_err(|e| BridgeError::Validation(format!("invalid message attribute: {e}")))
}

/// `None` when the attribute carries no payload at all.
#[must_use]
pub fn from_wire(value: &MessageAttributeValue) -> Option<AttributeValue> {
    let payload = if let Some(s) = value.string_value() {
        AttributePayload::String(s.to_string())
    } else if let Some(blob) = value.binary_value() {
        AttributePayload::Binary(blob.as_ref().to_vec())
    } else if !value.string_list_values().is_empty() {
        AttributePayload::StringList(value.string_list_values().to_vec())
    } else if !value.binary_list_values().is_empty() {
        AttributePayload::BinaryList(
            value
                .binary_list_values()
                .iter()
                .map(|blob| blob.as_ref().to_vec())
                .collect(),
        )
    } else {
        return None;
    };
    Some(AttributeValue {
        data_type: value.data_type().to_string(),
        payload,
    })
}

/// Converts a received message; messages without an id or receipt handle
/// cannot be acknowledged and are skipped (they stay in the queue).
#[must_use]
pub fn message_from_wire(message: &Message) -> Option<QueueMessage> {
    let (Some(id), Some(receipt_handle)) = (message.message_id(), message.receipt_handle()) else {
        warn!(
            message_id = ?message.message_id(),
            "Skipping SQS message without id or receipt handle"
        );
        return None;
    };

    let attributes: BTreeMap<String, AttributeValue> = message
        .message_attributes()
        .map(|attrs| {
            attrs
                .iter()
                .filter_map(|(name, value)| from_wire(value).map(|v| (name.clone(), v)))
                .collect()
        })
        .unwrap_or_default();

    Some(QueueMessage {
        id: id.to_string(),
        body: message.body().unwrap_or_default().to_string(),
        receipt_handle: receipt_handle.to_string(),
        attributes,
    })
}
