// Background collection worker (one gather per tick) and the JSON-lines
// metric writer task it feeds over a channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval};

use crate::collector::{MetricBuffer, NetIoCollector};
use crate::models::Metric;
use crate::source::NetIoSource;

/// Rate limit for the "no receivers" notice (avoid logging every tick when
/// no live subscriber is attached).
const NO_RECEIVERS_WARN_INTERVAL: Duration = Duration::from_secs(60);

/// Channel capacity for the metric writer (backpressure if it falls behind).
pub fn writer_channel_capacity(flush_rate: u64) -> usize {
    (flush_rate as usize * 2).max(32)
}

/// Collector, source, channels, and shutdown for the worker.
pub struct WorkerDeps {
    pub collector: Arc<NetIoCollector>,
    pub source: Arc<dyn NetIoSource>,
    pub tx: broadcast::Sender<Vec<Metric>>,
    pub write_tx: mpsc::Sender<Vec<Metric>>,
    pub metrics_written_total: Arc<AtomicU64>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

/// Worker timing and logging config.
pub struct WorkerConfig {
    pub sample_interval_ms: u64,
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
}

/// Writer config: batching for the dedicated metric writer task.
pub struct MetricWriterConfig {
    pub flush_rate: u64,
    pub flush_interval_secs: u64,
}

/// Spawns the background task that receives metric batches from the worker
/// and writes them as JSON lines.
/// Flushes when buffer len >= flush_rate, or every flush_interval_secs, or
/// when the channel closes. When the worker drops its sender, this task
/// flushes remaining and exits.
pub fn spawn_metric_writer(
    mut write_rx: mpsc::Receiver<Vec<Metric>>,
    mut out: Box<dyn AsyncWrite + Send + Unpin>,
    config: MetricWriterConfig,
    metrics_written_total: Arc<AtomicU64>,
) -> tokio::task::JoinHandle<()> {
    let flush_interval = Duration::from_secs(config.flush_interval_secs);
    tokio::spawn(async move {
        let mut buffer: Vec<Metric> = Vec::new();
        let mut flush_tick = interval(flush_interval);
        flush_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                result = write_rx.recv() => {
                    match result {
                        Some(mut metrics) => {
                            buffer.append(&mut metrics);
                            if buffer.len() >= config.flush_rate as usize
                                && let Err(e) = flush_buffer(out.as_mut(), &mut buffer, &metrics_written_total).await
                            {
                                tracing::warn!(error = %e, "metric writer: flush failed");
                            }
                        }
                        None => break,
                    }
                }
                _ = flush_tick.tick() => {
                    if let Err(e) = flush_buffer(out.as_mut(), &mut buffer, &metrics_written_total).await {
                        tracing::warn!(error = %e, "metric writer: flush failed");
                    }
                }
            }
        }
        if let Err(e) = flush_buffer(out.as_mut(), &mut buffer, &metrics_written_total).await {
            tracing::warn!(error = %e, "metric writer: final flush failed");
        }
        tracing::debug!("Metric writer shutting down");
    })
}

async fn flush_buffer(
    out: &mut (dyn AsyncWrite + Send + Unpin),
    buffer: &mut Vec<Metric>,
    metrics_written_total: &AtomicU64,
) -> anyhow::Result<()> {
    if buffer.is_empty() {
        return Ok(());
    }
    let n = buffer.len();
    let mut lines = Vec::with_capacity(n * 128);
    for metric in buffer.iter() {
        serde_json::to_writer(&mut lines, metric)?;
        lines.push(b'\n');
    }
    out.write_all(&lines).await?;
    out.flush().await?;
    metrics_written_total.fetch_add(n as u64, Ordering::Relaxed);
    buffer.clear();
    tracing::debug!(operation = "write_metrics", metrics_count = n, "Metrics written");
    Ok(())
}

pub fn spawn(deps: WorkerDeps, config: WorkerConfig) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        collector,
        source,
        tx,
        write_tx,
        metrics_written_total,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        sample_interval_ms,
        stats_log_interval_secs,
    } = config;

    let stats_log_interval = Duration::from_secs(stats_log_interval_secs);

    tokio::spawn(async move {
        let mut tick = interval(Duration::from_millis(sample_interval_ms));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(stats_log_interval);
        stats_log_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut cycles_failed_total: u64 = 0;
        let mut last_no_receivers_warn: Option<Instant> = None;

        let worker_span = tracing::span!(tracing::Level::DEBUG, "worker", sample_interval_ms);
        let _guard = worker_span.enter();

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let mut buf = MetricBuffer::default();
                    if let Err(e) = collector.gather(source.as_ref(), &mut buf) {
                        tracing::warn!(
                            error = %e,
                            operation = "gather",
                            "collection cycle failed"
                        );
                        cycles_failed_total += 1;
                        continue;
                    }
                    if buf.metrics.is_empty() {
                        // First cycle over fresh interfaces has no deltas yet
                        continue;
                    }

                    if tx.send(buf.metrics.clone()).is_err() {
                        let should_warn = last_no_receivers_warn
                            .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_WARN_INTERVAL);
                        if should_warn {
                            tracing::debug!(
                                operation = "broadcast_metrics",
                                "No live subscribers; broadcast channel has no receivers"
                            );
                            last_no_receivers_warn = Some(Instant::now());
                        }
                    }
                    if write_tx.send(buf.metrics).await.is_err() {
                        tracing::debug!("Metric writer channel closed");
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Worker shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        tracked_interfaces = collector.tracked_interfaces(),
                        metrics_written_total =
                            metrics_written_total.load(Ordering::Relaxed),
                        cycles_failed_total,
                        "app stats"
                    );
                }
            }
        }
    })
}
