//! Queue transport: the validated send/receive/delete surface the bridges use.

pub mod attributes;
mod client;

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::core::guard;
use crate::core::models::{AttributeValue, QueueMessage, is_fifo};
use crate::errors::Result;

pub use client::QueueTransport;

/// Largest batch a single receive may ask for.
pub const MAX_RECEIVE_MESSAGES: i32 = 10;

/// Requests every message attribute.
pub const ALL_ATTRIBUTES: &str = "All";

/// Operations the bridges need from the queue service.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Returns the sequence number for FIFO queues, the message id otherwise.
    async fn send(
        &self,
        url: &str,
        body: &str,
        group_id: Option<&str>,
        dedup_id: Option<&str>,
        attributes: Option<&BTreeMap<String, AttributeValue>>,
    ) -> Result<String>;

    /// May block up to `wait_time_seconds` waiting for messages.
    async fn receive(
        &self,
        url: &str,
        max_messages: i32,
        wait_time_seconds: i32,
        attributes_enabled: bool,
        attribute_names: &[String],
    ) -> Result<Vec<QueueMessage>>;

    async fn delete(&self, url: &str, receipt_handle: &str) -> Result<()>;

    /// Releases the underlying client. Returns `false` when already closed.
    fn close(&mut self) -> bool;
}

/// Checks FIFO requirements and returns the group and dedup ids to attach.
///
/// # Errors
///
/// Returns a validation error if `url` is a FIFO queue and either id is blank.
pub fn fifo_ids<'a>(
    url: &str,
    group_id: Option<&'a str>,
    dedup_id: Option<&'a str>,
) -> Result<Option<(&'a str, &'a str)>> {
    if !is_fifo(url) {
        return Ok(None);
    }
    guard::verify_not_blank(group_id, "groupId")?;
    guard::verify_not_blank(dedup_id, "messageId")?;
    Ok(group_id.zip(dedup_id))
}

/// Attribute names to request on receive; `None` requests none.
#[must_use]
pub fn requested_attribute_names(enabled: bool, names: &[String]) -> Option<Vec<String>> {
    if !enabled {
        None
    } else if names.is_empty() {
        Some(vec![ALL_ATTRIBUTES.to_string()])
    } else {
        Some(names.to_vec())
    }
}

/// # Errors
///
/// Returns a validation error for a bad URL, negative wait or batch outside `0..=10`.
pub fn validate_receive(url: &str, max_messages: i32, wait_time_seconds: i32) -> Result<()> {
    guard::verify_valid_url(url)?;
    guard::verify_non_negative(wait_time_seconds, "waitTimeSeconds")?;
    guard::verify_in_range(max_messages, 0, MAX_RECEIVE_MESSAGES, "maxMessages")
}

/// # Errors
///
/// Returns a validation error for a bad URL or blank receipt handle.
pub fn validate_delete(url: &str, receipt_handle: &str) -> Result<()> {
    guard::verify_valid_url(url)?;
    guard::verify_not_blank(Some(receipt_handle), "receiptHandle")
}
