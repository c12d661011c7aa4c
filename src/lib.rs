//! sqs-bridge - Moves messages between an Amazon SQS queue and a partitioned log.
//!
//! The crate provides the two directions of a Kafka Connect style bridge:
//! 1. A [`SourceBridge`] that long-polls a queue and turns each message into a
//!    [`LogRecord`], deleting the message only once the record is committed
//! 2. A [`SinkBridge`] that sends [`SinkRecord`]s to a queue, with FIFO group
//!    and deduplication ids derived from the record's log position
//!
//! # Architecture
//!
//! The system uses:
//! - aws-sdk-sqs for the queue operations
//! - aws-sdk-sts and aws-config for pluggable credentials providers
//! - Tokio for async runtime
//!
//! # Example
//!
//! ```no_run
//! use sqs_bridge::SourceBridge;
//! use sqs_bridge::core::config::{Properties, keys};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     sqs_bridge::setup_logging();
//!
//!     let props = Properties::from([
//!         (keys::QUEUE_URL.to_string(), "https://sqs.us-east-1.amazonaws.com/123456789012/orders".to_string()),
//!         (keys::REGION.to_string(), "us-east-1".to_string()),
//!         (keys::TOPICS.to_string(), "orders".to_string()),
//!     ]);
//!
//!     let mut bridge = SourceBridge::default();
//!     bridge.start(&props).await?;
//!     for record in bridge.poll().await? {
//!         println!("{}: {}", record.key, record.value);
//!         bridge.commit(&record).await?;
//!     }
//!     bridge.stop();
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod connector;
pub mod core;
pub mod errors;
pub mod sink;
pub mod source;
pub mod task;
pub mod transport;

pub use connector::{SinkConnector, SourceConnector};
pub use crate::core::models::{LogRecord, SinkRecord};
pub use errors::{BridgeError, Result};
pub use sink::{PutSummary, SinkBridge};
pub use source::SourceBridge;
pub use task::TaskPhase;

/// Version reported by connectors and bridges.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configure structured logging with JSON format.
///
/// The level filter is read from `RUST_LOG` and defaults to `info`, or `debug`
/// with the `debug-logs` feature. Calling it again after a subscriber is
/// installed has no effect.
///
/// # Example
///
/// ```
/// sqs_bridge::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let default_level = if cfg!(feature = "debug-logs") {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
