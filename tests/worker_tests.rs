// Worker integration tests: tick a collection loop against a mock source,
// and check the metric writer flushes JSON lines.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use common::{MockSource, counters, up};
use netgather::collector::NetIoCollector;
use netgather::config::CollectorConfig;
use netgather::models::{IoSnapshot, Metric, MetricKind, MetricValue};
use netgather::worker::{
    MetricWriterConfig, WorkerConfig, WorkerDeps, spawn, spawn_metric_writer,
    writer_channel_capacity,
};
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

fn sample_metric(value: i64) -> Metric {
    Metric {
        name: "net".to_string(),
        kind: MetricKind::Counter,
        fields: BTreeMap::from([("err_in".to_string(), MetricValue::Int(value))]),
        tags: BTreeMap::from([("interface".to_string(), "eth0".to_string())]),
    }
}

#[tokio::test]
async fn worker_ticks_broadcasts_and_feeds_the_writer() {
    let source = Arc::new(MockSource::new());
    source.set_interfaces(vec![up("eth0")]);
    source.set_io(vec![counters(
        "eth0",
        IoSnapshot {
            err_in: 5,
            ..Default::default()
        },
    )]);

    let collector = Arc::new(
        NetIoCollector::new(&CollectorConfig {
            ignore_protocol_stats: true,
            ..Default::default()
        })
        .unwrap(),
    );

    let (tx, mut rx) = broadcast::channel(10);
    let (write_tx, mut write_rx) = tokio::sync::mpsc::channel(writer_channel_capacity(2));
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let metrics_written_total = Arc::new(AtomicU64::new(0));

    let worker_handle = spawn(
        WorkerDeps {
            collector,
            source: source.clone(),
            tx,
            write_tx,
            metrics_written_total,
            shutdown_rx,
        },
        WorkerConfig {
            sample_interval_ms: 20,
            stats_log_interval_secs: 3600,
        },
    );

    // The first tick only primes the snapshot store; a later tick emits.
    let batch = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("broadcast within timeout")
        .expect("broadcast batch");
    assert!(!batch.is_empty());
    let metric = &batch[0];
    assert_eq!(metric.name, "net");
    assert_eq!(metric.tags["interface"], "eth0");
    assert_eq!(metric.fields["err_in"], MetricValue::Int(0));

    let written = timeout(Duration::from_secs(5), write_rx.recv())
        .await
        .expect("writer batch within timeout")
        .expect("writer batch");
    assert_eq!(written[0].tags["interface"], "eth0");

    let _ = shutdown_tx.send(());
    worker_handle.await.unwrap();
}

#[tokio::test]
async fn worker_keeps_ticking_after_a_failed_cycle() {
    let source = Arc::new(MockSource::new());
    source.fail_io();

    let collector = Arc::new(NetIoCollector::new(&CollectorConfig::default()).unwrap());
    let (tx, mut rx) = broadcast::channel(10);
    let (write_tx, _write_rx) = tokio::sync::mpsc::channel(32);
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let worker_handle = spawn(
        WorkerDeps {
            collector,
            source: source.clone(),
            tx,
            write_tx,
            metrics_written_total: Arc::new(AtomicU64::new(0)),
            shutdown_rx,
        },
        WorkerConfig {
            sample_interval_ms: 20,
            stats_log_interval_secs: 3600,
        },
    );

    // Let a few failing cycles pass, then recover the source.
    tokio::time::sleep(Duration::from_millis(80)).await;
    source.set_io(vec![counters(
        "eth0",
        IoSnapshot {
            err_in: 1,
            ..Default::default()
        },
    )]);
    source.set_interfaces(vec![up("eth0")]);

    let batch = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("broadcast within timeout")
        .expect("broadcast batch");
    assert_eq!(batch[0].tags["interface"], "eth0");

    let _ = shutdown_tx.send(());
    worker_handle.await.unwrap();
}

#[tokio::test]
async fn metric_writer_flushes_json_lines_and_exits_on_channel_close() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("metrics.jsonl");
    let file = tokio::fs::File::create(&path).await.unwrap();

    let metrics_written_total = Arc::new(AtomicU64::new(0));
    let (write_tx, write_rx) = tokio::sync::mpsc::channel(32);
    let writer_handle = spawn_metric_writer(
        write_rx,
        Box::new(file),
        MetricWriterConfig {
            flush_rate: 2,
            flush_interval_secs: 3600,
        },
        metrics_written_total.clone(),
    );

    write_tx.send(vec![sample_metric(1)]).await.unwrap();
    write_tx
        .send(vec![sample_metric(2), sample_metric(3)])
        .await
        .unwrap();
    drop(write_tx);
    writer_handle.await.unwrap();

    assert_eq!(metrics_written_total.load(Ordering::Relaxed), 3);

    let content = std::fs::read_to_string(&path).unwrap();
    let parsed: Vec<Metric> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(parsed.len(), 3);
    assert_eq!(parsed[0], sample_metric(1));
    assert_eq!(parsed[2].fields["err_in"], MetricValue::Int(3));
}

#[tokio::test]
async fn metric_writer_final_flush_covers_a_partial_buffer() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("metrics.jsonl");
    let file = tokio::fs::File::create(&path).await.unwrap();

    let (write_tx, write_rx) = tokio::sync::mpsc::channel(32);
    let writer_handle = spawn_metric_writer(
        write_rx,
        Box::new(file),
        MetricWriterConfig {
            flush_rate: 100,
            flush_interval_secs: 3600,
        },
        Arc::new(AtomicU64::new(0)),
    );

    // Below flush_rate, so only the shutdown flush writes it.
    write_tx.send(vec![sample_metric(9)]).await.unwrap();
    drop(write_tx);
    writer_handle.await.unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
}
