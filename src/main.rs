use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use anyhow::Result;
use netgather::*;
use tokio::io::AsyncWrite;
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        sample_interval_ms = app_config.monitoring.sample_interval_ms,
        "netgather starting"
    );

    let collector = Arc::new(collector::NetIoCollector::new(&app_config.collector)?);
    let source: Arc<dyn source::NetIoSource> = Arc::new(source::SysinfoSource::new());

    let (tx, _) = broadcast::channel::<Vec<models::Metric>>(
        app_config.monitoring.broadcast_capacity,
    );
    let metrics_written_total = Arc::new(AtomicU64::new(0));
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let out: Box<dyn AsyncWrite + Send + Unpin> = if app_config.output.path == "-" {
        Box::new(tokio::io::stdout())
    } else {
        Box::new(
            tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&app_config.output.path)
                .await?,
        )
    };

    let writer_capacity = worker::writer_channel_capacity(app_config.output.flush_rate);
    let (write_tx, write_rx) = mpsc::channel(writer_capacity);
    let writer_handle = worker::spawn_metric_writer(
        write_rx,
        out,
        worker::MetricWriterConfig {
            flush_rate: app_config.output.flush_rate,
            flush_interval_secs: app_config.output.flush_interval_secs,
        },
        metrics_written_total.clone(),
    );

    let worker_handle = worker::spawn(
        worker::WorkerDeps {
            collector,
            source,
            tx: tx.clone(),
            write_tx,
            metrics_written_total,
            shutdown_rx,
        },
        worker::WorkerConfig {
            sample_interval_ms: app_config.monitoring.sample_interval_ms,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
    );

    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, ctrl-c only");
                tokio::signal::ctrl_c().await?;
                shutdown(shutdown_tx, worker_handle, writer_handle).await;
                return Ok(());
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }

    tracing::info!("Received shutdown signal");
    shutdown(shutdown_tx, worker_handle, writer_handle).await;
    Ok(())
}

async fn shutdown(
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    worker_handle: tokio::task::JoinHandle<()>,
    writer_handle: tokio::task::JoinHandle<()>,
) {
    let _ = shutdown_tx.send(());
    // Worker exit drops its writer sender; the writer then final-flushes.
    let _ = worker_handle.await;
    let _ = writer_handle.await;
}
