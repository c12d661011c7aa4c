//! `sqs-bridge source|sink`
//!
//! Source mode writes each record as a JSON line to stdout and commits it once
//! the line is flushed. Sink mode reads JSON sink records from stdin, one per
//! line. Configuration comes from `SQS_*` and `TOPICS*` environment variables.

use anyhow::{Context, Result, bail};
use sqs_bridge::core::config::{Properties, SinkConfig, props_from_env};
use sqs_bridge::{SinkBridge, SinkConnector, SinkRecord, SourceBridge, SourceConnector};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinSet;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{error, info, warn};

const SINK_BATCH_SIZE: usize = 10;
const POLL_RETRIES: usize = 8;
const POLL_MAX_DELAY: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    sqs_bridge::setup_logging();

    let props = props_from_env(std::env::vars());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            let _ = shutdown_tx.send(true);
        }
    });

    match std::env::args().nth(1).as_deref() {
        Some("source") => run_source(props, shutdown_rx).await,
        Some("sink") => run_sink(props, shutdown_rx).await,
        other => bail!("usage: sqs-bridge source|sink (got {other:?})"),
    }
}

async fn run_source(props: Properties, shutdown: watch::Receiver<bool>) -> Result<()> {
    let tasks = match std::env::var("BRIDGE_TASKS") {
        Ok(value) => value
            .parse::<usize>()
            .with_context(|| format!("BRIDGE_TASKS must be a number, got '{value}'"))?,
        Err(_) => 1,
    };

    let mut connector = SourceConnector::default();
    connector.start(props)?;
    info!(version = connector.version(), tasks, "Starting source");

    let stdout = Arc::new(Mutex::new(tokio::io::stdout()));
    let mut running = JoinSet::new();
    for task_props in connector.task_configs(tasks)? {
        running.spawn(run_source_task(task_props, stdout.clone(), shutdown.clone()));
    }

    let mut result = Ok(());
    while let Some(joined) = running.join_next().await {
        if let Err(e) = joined.context("source task panicked").and_then(|r| r) {
            error!(error = %e, "Source task failed");
            result = Err(e);
        }
    }
    connector.stop();
    result
}

/// Delays between poll attempts after a failure; the task gives up once
/// they are exhausted.
fn poll_backoff() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(2)
        .factor(250)
        .max_delay(POLL_MAX_DELAY)
        .map(jitter)
        .take(POLL_RETRIES)
}

async fn run_source_task(
    props: Properties,
    stdout: Arc<Mutex<Stdout>>,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let bridge = Arc::new(Mutex::new(SourceBridge::default()));
    bridge.lock().await.start(&props).await?;

    let result = pump_source(&bridge, &stdout, shutdown).await;
    bridge.lock().await.stop();
    result
}

async fn pump_source(
    bridge: &Arc<Mutex<SourceBridge>>,
    stdout: &Mutex<Stdout>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    loop {
        let polled = tokio::select! {
            _ = shutdown.changed() => return Ok(()),
            polled = Retry::spawn(poll_backoff(), || {
                let bridge = Arc::clone(bridge);
                async move {
                    let polled = bridge.lock().await.poll().await;
                    polled.inspect_err(|e| warn!(error = %e, "Poll failed"))
                }
            }) => polled,
        };
        let records = polled.context("polling gave up after repeated failures")?;

        let mut guard = bridge.lock().await;
        for record in records {
            let mut line = serde_json::to_vec(&record)?;
            line.push(b'\n');
            {
                let mut out = stdout.lock().await;
                out.write_all(&line).await?;
                out.flush().await?;
            }
            // An uncommitted message is redelivered after its visibility timeout.
            if let Err(e) = guard.commit(&record).await {
                warn!(error = %e, key = %record.key, "Commit failed");
            }
        }
    }
}

async fn run_sink(props: Properties, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let mut connector = SinkConnector::default();
    connector.start(props.clone())?;
    let topics = SinkConfig::from_props(&props)?.topics;
    info!(version = connector.version(), "Starting sink");

    let mut bridge = SinkBridge::default();
    bridge.start(&props).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut batch: Vec<SinkRecord> = Vec::with_capacity(SINK_BATCH_SIZE);
    loop {
        let line = tokio::select! {
            _ = shutdown.changed() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let record: SinkRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Skipping unparseable input line");
                continue;
            }
        };
        if !topics.matches(&record.topic) {
            continue;
        }

        batch.push(record);
        if batch.len() == SINK_BATCH_SIZE {
            bridge.put(&batch).await?;
            batch.clear();
        }
    }

    bridge.put(&batch).await?;
    bridge.stop();
    connector.stop();
    Ok(())
}
