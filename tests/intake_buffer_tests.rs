//! # Intake Buffer Tests
//!
//! Runs with a paused tokio clock so the debounce window can be checked to
//! the millisecond.

mod common;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use facade_sorter::intake_buffer::{Batch, BatchSink, IntakeBuffer};

const WINDOW: Duration = Duration::from_millis(1000);

/// Sink that remembers every batch and when it arrived
#[derive(Default)]
struct RecordingSink {
    batches: Mutex<Vec<(Instant, Batch)>>,
}

#[async_trait]
impl BatchSink for RecordingSink {
    async fn flush(&self, batch: Batch) {
        self.batches.lock().await.push((Instant::now(), batch));
    }
}

impl RecordingSink {
    async fn taken(&self) -> Vec<(Instant, Batch)> {
        self.batches.lock().await.clone()
    }
}

fn buffer() -> (IntakeBuffer<RecordingSink>, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    (IntakeBuffer::new(Arc::clone(&sink), WINDOW), sink)
}

fn unique_ids(batch: &Batch) -> Vec<&str> {
    batch
        .attachments
        .iter()
        .map(|a| a.unique_id.as_str())
        .collect()
}

fn assert_close(actual: Duration, expected: Duration) {
    let diff = actual.abs_diff(expected);
    assert!(
        diff <= Duration::from_millis(5),
        "expected flush at {expected:?}, got {actual:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_single_attachment_flushes_immediately() {
    let (buffer, sink) = buffer();

    buffer.ingest(7, None, common::photo("solo")).await;

    let batches = sink.taken().await;
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].1.group, None);
    assert_eq!(unique_ids(&batches[0].1), vec!["solo"]);
    assert_eq!(buffer.pending_batches().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_group_flushes_once_after_last_arrival() {
    let (buffer, sink) = buffer();
    let group = Some("album-1".to_string());
    let start = Instant::now();

    buffer.ingest(7, group.clone(), common::photo("a")).await;
    sleep(Duration::from_millis(400)).await;
    buffer.ingest(7, group.clone(), common::photo("b")).await;
    sleep(Duration::from_millis(400)).await;
    buffer.ingest(7, group.clone(), common::photo("c")).await;

    sleep(Duration::from_millis(990)).await;
    assert!(sink.taken().await.is_empty(), "flushed before the window elapsed");
    assert_eq!(buffer.pending_batches().await, 1);

    sleep(Duration::from_millis(50)).await;
    let batches = sink.taken().await;
    assert_eq!(batches.len(), 1);
    let (at, batch) = &batches[0];
    assert_close(*at - start, Duration::from_millis(1800));
    assert_eq!(batch.group.as_deref(), Some("album-1"));
    assert_eq!(unique_ids(batch), vec!["a", "b", "c"]);

    // No stale timer fires a second time
    sleep(Duration::from_secs(5)).await;
    assert_eq!(sink.taken().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_gap_longer_than_window_splits_batches() {
    let (buffer, sink) = buffer();
    let group = Some("album-2".to_string());
    let start = Instant::now();

    buffer.ingest(7, group.clone(), common::photo("a")).await;
    sleep(Duration::from_millis(300)).await;
    buffer.ingest(7, group.clone(), common::photo("b")).await;
    sleep(Duration::from_millis(1200)).await;
    buffer.ingest(7, group.clone(), common::photo("c")).await;
    sleep(Duration::from_millis(200)).await;
    buffer.ingest(7, group.clone(), common::photo("d")).await;
    sleep(Duration::from_secs(3)).await;

    let batches = sink.taken().await;
    assert_eq!(batches.len(), 2);
    assert_close(batches[0].0 - start, Duration::from_millis(1300));
    assert_eq!(unique_ids(&batches[0].1), vec!["a", "b"]);
    assert_close(batches[1].0 - start, Duration::from_millis(2700));
    assert_eq!(unique_ids(&batches[1].1), vec!["c", "d"]);
}

#[tokio::test(start_paused = true)]
async fn test_users_are_buffered_independently() {
    let (buffer, sink) = buffer();
    let group = Some("shared".to_string());

    buffer.ingest(1, group.clone(), common::photo("u1-a")).await;
    buffer.ingest(2, group.clone(), common::photo("u2-a")).await;
    buffer.ingest(1, group.clone(), common::photo("u1-b")).await;
    assert_eq!(buffer.pending_batches().await, 2);

    sleep(Duration::from_secs(2)).await;

    let mut batches: Vec<Batch> = sink.taken().await.into_iter().map(|(_, b)| b).collect();
    batches.sort_by_key(|b| b.user);
    assert_eq!(batches.len(), 2);
    assert_eq!(unique_ids(&batches[0]), vec!["u1-a", "u1-b"]);
    assert_eq!(unique_ids(&batches[1]), vec!["u2-a"]);
}

#[tokio::test(start_paused = true)]
async fn test_flush_all_drains_open_batches() {
    let (buffer, sink) = buffer();

    buffer.ingest(1, Some("g1".to_string()), common::photo("a")).await;
    buffer.ingest(1, Some("g2".to_string()), common::photo("b")).await;

    buffer.flush_all().await;
    assert_eq!(sink.taken().await.len(), 2);
    assert_eq!(buffer.pending_batches().await, 0);

    // The aborted timers must not flush again
    sleep(Duration::from_secs(3)).await;
    assert_eq!(sink.taken().await.len(), 2);
}

/// Sink that takes a while to persist each batch
#[derive(Default)]
struct SlowSink {
    started: Mutex<usize>,
    finished: Mutex<Vec<Batch>>,
}

#[async_trait]
impl BatchSink for SlowSink {
    async fn flush(&self, batch: Batch) {
        *self.started.lock().await += 1;
        sleep(Duration::from_millis(500)).await;
        self.finished.lock().await.push(batch);
    }
}

#[tokio::test(start_paused = true)]
async fn test_flush_all_waits_for_batches_already_flushing() {
    let sink = Arc::new(SlowSink::default());
    let buffer = IntakeBuffer::new(Arc::clone(&sink), WINDOW);

    buffer.ingest(7, Some("g".to_string()), common::photo("a")).await;
    buffer.ingest(7, Some("g".to_string()), common::photo("b")).await;

    // Timer fired at 1000 ms, the sink is busy until 1500 ms
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(*sink.started.lock().await, 1);
    assert_eq!(buffer.pending_batches().await, 0);
    assert!(sink.finished.lock().await.is_empty());

    buffer.flush_all().await;

    let finished = sink.finished.lock().await;
    assert_eq!(finished.len(), 1);
    assert_eq!(unique_ids(&finished[0]), vec!["a", "b"]);
}

#[tokio::test(start_paused = true)]
async fn test_flush_all_covers_pending_and_flushing_batches() {
    let sink = Arc::new(SlowSink::default());
    let buffer = IntakeBuffer::new(Arc::clone(&sink), WINDOW);

    buffer.ingest(1, Some("early".to_string()), common::photo("e")).await;
    sleep(Duration::from_millis(1100)).await;
    buffer.ingest(2, Some("late".to_string()), common::photo("l")).await;

    buffer.flush_all().await;

    let mut users: Vec<u64> = sink.finished.lock().await.iter().map(|b| b.user).collect();
    users.sort_unstable();
    assert_eq!(users, vec![1, 2]);

    sleep(Duration::from_secs(3)).await;
    assert_eq!(sink.finished.lock().await.len(), 2);
}
