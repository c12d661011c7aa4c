//! Queue → log direction.
//!
//! A message is only deleted from the queue when the scheduler commits the
//! record produced for it. Anything received but never committed becomes
//! visible again after the queue's visibility timeout and is redelivered.

mod partition;

use tracing::{debug, info, trace};

use crate::core::config::{Properties, SourceConfig};
use crate::core::models::{Header, LogRecord, QueueMessage, SourcePosition};
use crate::errors::{BridgeError, Result};
use crate::task::{TaskPhase, TaskState};
use crate::transport::{MessageQueue, QueueTransport};

pub use partition::PartitionKeyStrategy;

struct SourceTask {
    config: SourceConfig,
    keys: PartitionKeyStrategy,
}

pub struct SourceBridge {
    version: &'static str,
    state: TaskState<SourceTask>,
}

impl Default for SourceBridge {
    fn default() -> Self {
        Self::new(crate::VERSION)
    }
}

impl SourceBridge {
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

    /// Parses the properties and connects to the queue.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid properties, or a validation
    /// error if the SQS client cannot be built.
    pub async fn start(&mut self, props: &Properties) -> Result<()> {
        info!("task.start");
        let config = SourceConfig::from_props(props)?;
        let transport =
            QueueTransport::connect(&config.queue.endpoint, &config.queue.credentials).await?;
        self.start_with(config, Box::new(transport));
        Ok(())
    }

    /// Starts with an already connected queue.
    pub fn start_with(&mut self, config: SourceConfig, queue: Box<dyn MessageQueue>) {
        info!(
            queue_url = %config.queue.queue_url(),
            topic = %config.topic,
            "task.start.OK"
        );
        let keys = PartitionKeyStrategy::from_config(&config);
        self.state.start(SourceTask { config, keys }, queue);
    }

    /// Receives one batch and converts it, preserving the queue's order.
    ///
    /// # Errors
    ///
    /// Returns an illegal-state error before start or after stop; receive
    /// failures are returned unchanged.
    pub async fn poll(&mut self) -> Result<Vec<LogRecord>> {
        let running = self.state.running()?;
        let config = &running.task.config;

        let messages = running
            .queue
            .receive(
                config.queue.queue_url(),
                config.max_messages,
                config.wait_time_seconds,
                config.queue.attributes_enabled,
                &config.queue.attribute_names,
            )
            .await?;
        debug!(
            queue_url = %config.queue.queue_url(),
            max = config.max_messages,
            wait = config.wait_time_seconds,
            size = messages.len(),
            ".poll"
        );

        Ok(messages
            .into_iter()
            .map(|message| to_record(message, &running.task))
            .collect())
    }

    /// Deletes the queue message the record was produced from.
    ///
    /// # Errors
    ///
    /// Returns an illegal-argument error if the record carries no position or
    /// one from another queue, an illegal-state error when not running, and
    /// delete failures unchanged.
    pub async fn commit(&mut self, record: &LogRecord) -> Result<()> {
        let position = record.position.as_ref().ok_or_else(|| {
            BridgeError::IllegalArgument("record carries no source position".to_string())
        })?;
        let running = self.state.running()?;
        let queue_url = running.task.config.queue.queue_url();
        if position.queue_url != queue_url {
            return Err(BridgeError::IllegalArgument(format!(
                "record comes from {}, not from {queue_url}",
                position.queue_url
            )));
        }

        debug!(
            queue_url = %queue_url,
            receipt_handle = %position.receipt_handle,
            ".commit-record"
        );
        running
            .queue
            .delete(queue_url, &position.receipt_handle)
            .await
    }

    /// Closes the queue; later calls do nothing.
    pub fn stop(&mut self) {
        self.state.stop();
    }
}

fn to_record(message: QueueMessage, task: &SourceTask) -> LogRecord {
    let key = task.keys.key_for(&message);
    let headers = if task.config.queue.attributes_enabled {
        message
            .string_attributes()
            .map(|(name, value)| Header::string(name, value))
            .collect()
    } else {
        Vec::new()
    };
    let position = SourcePosition {
        queue_url: task.config.queue.queue_url().to_string(),
        message_id: message.id,
        receipt_handle: message.receipt_handle,
    };
    trace!(position = ?position, ".poll:source-offset");

    LogRecord {
        topic: task.config.topic.clone(),
        key,
        value: message.body,
        headers,
        position: Some(position),
    }
}
