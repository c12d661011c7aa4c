//! Log → queue direction.

pub mod ids;

use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

use crate::core::config::{Properties, SinkConfig};
use crate::core::guard;
use crate::core::models::{AttributeValue, HeaderValue, SinkRecord};
use crate::errors::Result;
use crate::task::{TaskPhase, TaskState};
use crate::transport::{MessageQueue, QueueTransport};

/// Outcome of one [`SinkBridge::put`] batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutSummary {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PutSummary {
    #[must_use]
    pub fn total(&self) -> usize {
        self.sent + self.skipped + self.failed
    }
}

pub struct SinkBridge {
    version: &'static str,
    state: TaskState<SinkConfig>,
}

impl Default for SinkBridge {
    fn default() -> Self {
        Self::new(crate::VERSION)
    }
}

impl SinkBridge {
    #[must_use]
    pub fn new(version: &'static str) -> Self {
        Self {
            version,
            state: TaskState::Idle,
        }
    }

    #[must_use]
    pub fn version(&self) -> &str {
        self.version
    }

    #[must_use]
    pub fn phase(&self) -> TaskPhase {
        self.state.phase()
    }

    /// # Errors
    ///
    /// Returns a configuration error for invalid properties, or a validation
    /// error if the SQS client cannot be built.
    pub async fn start(&mut self, props: &Properties) -> Result<()> {
        info!("task.start");
        let config = SinkConfig::from_props(props)?;
        let transport =
            QueueTransport::connect(&config.queue.endpoint, &config.queue.credentials).await?;
        self.start_with(config, Box::new(transport));
        Ok(())
    }

    pub fn start_with(&mut self, config: SinkConfig, queue: Box<dyn MessageQueue>) {
        info!(
            queue_url = %config.queue.queue_url(),
            fifo = config.queue.endpoint.is_fifo(),
            "task.start.OK"
        );
        self.state.start(config, queue);
    }

    /// Sends each record with a non-blank value and a non-negative log
    /// position to the queue, in order.
    ///
    /// A failed send is logged and counted unless `sqs.sink.fail.on.send.error`
    /// is set, in which case it is returned and the rest of the batch is left
    /// unsent.
    ///
    /// # Errors
    ///
    /// Returns an illegal-state error when records arrive before start or
    /// after stop.
    pub async fn put(&mut self, records: &[SinkRecord]) -> Result<PutSummary> {
        let mut summary = PutSummary::default();
        if records.is_empty() {
            return Ok(summary);
        }
        let running = self.state.running()?;
        let config = &running.task;
        let url = config.queue.queue_url();

        for record in records {
            let Some(body) = record.value.as_deref().filter(|v| !guard::is_blank(v)) else {
                warn!(
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    "Skipping record with empty value"
                );
                summary.skipped += 1;
                continue;
            };

            let Some(dedup_id) = ids::dedup_id(record) else {
                error!(
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    "Skipping record with negative partition or offset"
                );
                summary.skipped += 1;
                continue;
            };
            let group_id = ids::group_id(record);
            let attributes = config
                .queue
                .attributes_enabled
                .then(|| message_attributes(record, &config.queue.attribute_names));

            match running
                .queue
                .send(url, body, Some(&group_id), Some(&dedup_id), attributes.as_ref())
                .await
            {
                Ok(id) => {
                    debug!(
                        topic = %record.topic,
                        partition = record.partition,
                        offset = record.offset,
                        id = %id,
                        ".put.OK"
                    );
                    summary.sent += 1;
                }
                Err(e) if config.fail_on_send_error => {
                    error!(error = %e, dedup_id = %dedup_id, "Send failed, failing the batch");
                    return Err(e);
                }
                Err(e) => {
                    error!(
                        error = %e,
                        topic = %record.topic,
                        partition = record.partition,
                        offset = record.offset,
                        "Send failed, dropping record"
                    );
                    summary.failed += 1;
                }
            }
        }

        info!(
            sent = summary.sent,
            skipped = summary.skipped,
            failed = summary.failed,
            ".put"
        );
        Ok(summary)
    }

    pub fn stop(&mut self) {
        self.state.stop();
    }
}

/// String headers as `String` attributes, restricted to `include` when non-empty.
fn message_attributes(record: &SinkRecord, include: &[String]) -> BTreeMap<String, AttributeValue> {
    record
        .headers
        .iter()
        .filter(|h| include.is_empty() || include.iter().any(|name| name == &h.name))
        .filter_map(|h| match &h.value {
            HeaderValue::String(value) => Some((h.name.clone(), AttributeValue::string(value))),
            HeaderValue::Integer(_) | HeaderValue::Boolean(_) | HeaderValue::Bytes(_) => None,
        })
        .collect()
}
