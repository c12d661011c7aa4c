//! Connector entry points: validate properties once and hand out task
//! configurations to the scheduler.

use tracing::info;

use crate::core::config::{Properties, SinkConfig, SourceConfig};
use crate::errors::{BridgeError, Result};

fn task_configs(props: Option<&Properties>, max_tasks: usize) -> Result<Vec<Properties>> {
    let props = props.ok_or_else(|| {
        BridgeError::IllegalState("Connector has not been started".to_string())
    })?;
    Ok(vec![props.clone(); max_tasks.max(1)])
}

#[derive(Debug, Default)]
pub struct SourceConnector {
    props: Option<Properties>,
}

impl SourceConnector {
    /// # Errors
    ///
    /// Returns a configuration error if the properties do not describe a source.
    pub fn start(&mut self, props: Properties) -> Result<()> {
        let config = SourceConfig::from_props(&props)?;
        info!(queue_url = %config.queue.queue_url(), topic = %config.topic, "source connector started");
        self.props = Some(props);
        Ok(())
    }

    /// Every task polls the same queue; SQS hands each message to one receiver.
    ///
    /// # Errors
    ///
    /// Returns an illegal-state error before [`SourceConnector::start`].
    pub fn task_configs(&self, max_tasks: usize) -> Result<Vec<Properties>> {
        task_configs(self.props.as_ref(), max_tasks)
    }

    #[must_use]
    pub fn version(&self) -> &'static str {
        crate::VERSION
    }

    pub fn stop(&mut self) {
        self.props = None;
    }
}

#[derive(Debug, Default)]
pub struct SinkConnector {
    props: Option<Properties>,
}

impl SinkConnector {
    /// # Errors
    ///
    /// Returns a configuration error if the properties do not describe a sink.
    pub fn start(&mut self, props: Properties) -> Result<()> {
        let config = SinkConfig::from_props(&props)?;
        info!(queue_url = %config.queue.queue_url(), "sink connector started");
        self.props = Some(props);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an illegal-state error before [`SinkConnector::start`].
    pub fn task_configs(&self, max_tasks: usize) -> Result<Vec<Properties>> {
        task_configs(self.props.as_ref(), max_tasks)
    }

    #[must_use]
    pub fn version(&self) -> &'static str {
        crate::VERSION
    }

    pub fn stop(&mut self) {
        self.props = None;
    }
}
