#![allow(dead_code)]

use async_trait::async_trait;
use sqs_bridge::BridgeError;
use sqs_bridge::core::models::{AttributeValue, QueueMessage};
use sqs_bridge::errors::Result;
use sqs_bridge::transport::{MessageQueue, fifo_ids, validate_delete, validate_receive};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub url: String,
    pub body: String,
    pub group_id: Option<String>,
    pub dedup_id: Option<String>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

#[derive(Default)]
struct State {
    pending: VecDeque<QueueMessage>,
    in_flight: Vec<QueueMessage>,
    sent: Vec<SentMessage>,
    deleted: Vec<String>,
    receive_calls: Vec<(i32, i32, bool, Vec<String>)>,
    fail_sends_for: Vec<String>,
    closed: usize,
}

/// In-memory queue; clones share state so tests can inspect what a bridge did.
#[derive(Clone, Default)]
pub struct MemoryQueue {
    state: Arc<Mutex<State>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: QueueMessage) {
        self.state.lock().unwrap().pending.push_back(message);
    }

    /// Sends whose body equals `body` fail with a transport error.
    pub fn fail_sends_for(&self, body: &str) {
        self.state.lock().unwrap().fail_sends_for.push(body.to_string());
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn in_flight(&self) -> usize {
        self.state.lock().unwrap().in_flight.len()
    }

    pub fn receive_calls(&self) -> Vec<(i32, i32, bool, Vec<String>)> {
        self.state.lock().unwrap().receive_calls.clone()
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().unwrap().closed
    }

    /// Makes every in-flight message visible again, as a visibility timeout would.
    pub fn expire_visibility(&self) {
        let mut state = self.state.lock().unwrap();
        let expired: Vec<_> = state.in_flight.drain(..).collect();
        for message in expired.into_iter().rev() {
            state.pending.push_front(message);
        }
    }
}

pub fn message(id: &str, body: &str) -> QueueMessage {
    QueueMessage {
        id: id.to_string(),
        body: body.to_string(),
        receipt_handle: format!("rh-{id}"),
        attributes: BTreeMap::new(),
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn send(
        &self,
        url: &str,
        body: &str,
        group_id: Option<&str>,
        dedup_id: Option<&str>,
        attributes: Option<&BTreeMap<String, AttributeValue>>,
    ) -> Result<String> {
        let fifo = fifo_ids(url, group_id, dedup_id)?;
        let mut state = self.state.lock().unwrap();
        if state.fail_sends_for.iter().any(|b| b == body) {
            return Err(BridgeError::Transport(format!("send of '{body}' rejected")));
        }
        state.sent.push(SentMessage {
            url: url.to_string(),
            body: body.to_string(),
            group_id: fifo.map(|(g, _)| g.to_string()),
            dedup_id: fifo.map(|(_, d)| d.to_string()),
            attributes: attributes.cloned().unwrap_or_default(),
        });
        Ok(format!("id-{}", state.sent.len()))
    }

    async fn receive(
        &self,
        url: &str,
        max_messages: i32,
        wait_time_seconds: i32,
        attributes_enabled: bool,
        attribute_names: &[String],
    ) -> Result<Vec<QueueMessage>> {
        validate_receive(url, max_messages, wait_time_seconds)?;
        let mut state = self.state.lock().unwrap();
        state.receive_calls.push((
            max_messages,
            wait_time_seconds,
            attributes_enabled,
            attribute_names.to_vec(),
        ));
        let take = usize::try_from(max_messages).unwrap_or(0).min(state.pending.len());
        let batch: Vec<_> = state.pending.drain(..take).collect();
        state.in_flight.extend(batch.iter().cloned());
        Ok(batch)
    }

    async fn delete(&self, url: &str, receipt_handle: &str) -> Result<()> {
        validate_delete(url, receipt_handle)?;
        let mut state = self.state.lock().unwrap();
        state.in_flight.retain(|m| m.receipt_handle != receipt_handle);
        state.deleted.push(receipt_handle.to_string());
        Ok(())
    }

    fn close(&mut self) -> bool {
        self.state.lock().unwrap().closed += 1;
        true
    }
}

pub const QUEUE_URL: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/orders";
pub const FIFO_QUEUE_URL: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/orders.fifo";

pub fn props(url: &str, extra: &[(&str, &str)]) -> sqs_bridge::core::config::Properties {
    use sqs_bridge::core::config::keys;
    let mut props = sqs_bridge::core::config::Properties::from([
        (keys::QUEUE_URL.to_string(), url.to_string()),
        (keys::REGION.to_string(), "us-east-1".to_string()),
        (keys::TOPICS.to_string(), "orders".to_string()),
    ]);
    for (k, v) in extra {
        props.insert((*k).to_string(), (*v).to_string());
    }
    props
}
