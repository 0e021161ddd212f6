//! Tests for the output stage

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use hauler_condition::Gate;
use serde_json::json;

use super::*;
use crate::Output;
use crate::filter_stage::StageActions;

fn event(value: serde_json::Value) -> Event {
    match value {
        serde_json::Value::Object(map) => Event::from(map),
        _ => unreachable!(),
    }
}

/// Records every emitted batch; fails the first `fail_first` emit calls.
#[derive(Default)]
struct RecordingOutput {
    batches: Arc<Mutex<Vec<Vec<Event>>>>,
    fail_first: u32,
    calls: AtomicU32,
    shutdowns: Arc<AtomicU32>,
}

impl RecordingOutput {
    fn new(batches: Arc<Mutex<Vec<Vec<Event>>>>) -> Self {
        Self {
            batches,
            ..Default::default()
        }
    }

    fn failing(batches: Arc<Mutex<Vec<Vec<Event>>>>, fail_first: u32) -> Self {
        Self {
            batches,
            fail_first,
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl Output for RecordingOutput {
    async fn emit(&mut self, events: &[Event]) -> bool {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            return false;
        }
        self.batches.lock().unwrap().push(events.to_vec());
        true
    }

    async fn shutdown(&mut self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

fn fast_retry(max_attempts: u32) -> RetrySettings {
    RetrySettings {
        max_attempts,
        min_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(2),
    }
}

fn stage_with(
    driver: RecordingOutput,
    batch: BatchSettings,
    retry: RetrySettings,
    dead_letter: Option<Box<dyn Output>>,
) -> OutputStage {
    OutputStage::new(
        "recording",
        Box::new(driver),
        Gate::pass_all(),
        StageActions::default(),
        batch,
        retry,
        dead_letter,
        CancellationToken::new(),
    )
}

#[tokio::test]
async fn test_flush_on_batch_size_with_final_drain() {
    // Seven events through batch_size 3: [3, 3, 1], the last at shutdown.
    let batches = Arc::new(Mutex::new(Vec::new()));
    let mut stage = stage_with(
        RecordingOutput::new(Arc::clone(&batches)),
        BatchSettings {
            size: 3,
            ..Default::default()
        },
        fast_retry(3),
        None,
    );

    for i in 0..7 {
        stage.process(event(json!({"n": i}))).await;
    }
    stage.shutdown().await;

    let sizes: Vec<usize> = batches.lock().unwrap().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![3, 3, 1]);
}

#[tokio::test]
async fn test_unbatched_emits_per_event() {
    let batches = Arc::new(Mutex::new(Vec::new()));
    let mut stage = stage_with(
        RecordingOutput::new(Arc::clone(&batches)),
        BatchSettings::default(),
        fast_retry(3),
        None,
    );

    stage.process(event(json!({"n": 0}))).await;
    stage.process(event(json!({"n": 1}))).await;

    let sizes: Vec<usize> = batches.lock().unwrap().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![1, 1]);
}

#[tokio::test]
async fn test_flush_before_byte_limit_would_exceed() {
    let batches = Arc::new(Mutex::new(Vec::new()));
    let line_len = event(json!({"n": 0})).to_json_line().len();
    let mut stage = stage_with(
        RecordingOutput::new(Arc::clone(&batches)),
        BatchSettings {
            size: 100,
            bytes: Some(line_len * 2),
            ..Default::default()
        },
        fast_retry(3),
        None,
    );

    for i in 0..5 {
        stage.process(event(json!({"n": i}))).await;
    }
    stage.shutdown().await;

    let sizes: Vec<usize> = batches.lock().unwrap().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
}

#[tokio::test]
async fn test_gate_filters_events_out() {
    let batches = Arc::new(Mutex::new(Vec::new()));
    let mut stage = OutputStage::new(
        "recording",
        Box::new(RecordingOutput::new(Arc::clone(&batches))),
        Gate::compile(&[r#"EQ(level, "error")"#]).unwrap(),
        StageActions::default(),
        BatchSettings::default(),
        fast_retry(3),
        None,
        CancellationToken::new(),
    );

    stage.process(event(json!({"level": "info"}))).await;
    stage.process(event(json!({"level": "error"}))).await;
    stage.shutdown().await;

    let recorded = batches.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0][0].get_str("level"), Some("error"));
}

#[tokio::test]
async fn test_retry_until_success() {
    let batches = Arc::new(Mutex::new(Vec::new()));
    let mut stage = stage_with(
        RecordingOutput::failing(Arc::clone(&batches), 2),
        BatchSettings::default(),
        fast_retry(5),
        None,
    );
    let metrics = stage.metrics();

    stage.process(event(json!({"n": 1}))).await;

    assert_eq!(batches.lock().unwrap().len(), 1);
    assert_eq!(metrics.retries.load(Ordering::Relaxed), 2);
    assert_eq!(metrics.events_dropped.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn test_exhausted_retries_drop_without_dead_letter() {
    let batches = Arc::new(Mutex::new(Vec::new()));
    let mut stage = stage_with(
        RecordingOutput::failing(Arc::clone(&batches), u32::MAX),
        BatchSettings::default(),
        fast_retry(2),
        None,
    );
    let metrics = stage.metrics();

    stage.process(event(json!({"n": 1}))).await;

    assert!(batches.lock().unwrap().is_empty());
    assert_eq!(metrics.events_dropped.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_exhausted_retries_go_to_dead_letter() {
    let batches = Arc::new(Mutex::new(Vec::new()));
    let dead = Arc::new(Mutex::new(Vec::new()));
    let mut stage = stage_with(
        RecordingOutput::failing(Arc::clone(&batches), u32::MAX),
        BatchSettings {
            size: 2,
            ..Default::default()
        },
        fast_retry(2),
        Some(Box::new(RecordingOutput::new(Arc::clone(&dead)))),
    );
    let metrics = stage.metrics();

    stage.process(event(json!({"n": 1}))).await;
    stage.process(event(json!({"n": 2}))).await;

    assert!(batches.lock().unwrap().is_empty());
    let dead = dead.lock().unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].len(), 2);
    assert_eq!(metrics.events_dead_lettered.load(Ordering::Relaxed), 2);
    assert_eq!(metrics.events_dropped.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn test_tick_flushes_aged_buffer() {
    let batches = Arc::new(Mutex::new(Vec::new()));
    let mut stage = stage_with(
        RecordingOutput::new(Arc::clone(&batches)),
        BatchSettings {
            size: 100,
            interval: Duration::ZERO,
            ..Default::default()
        },
        fast_retry(3),
        None,
    );

    stage.process(event(json!({"n": 1}))).await;
    assert!(batches.lock().unwrap().is_empty());

    stage.tick().await;
    assert_eq!(batches.lock().unwrap().len(), 1);

    // An empty buffer has no age; tick is a no-op.
    stage.tick().await;
    assert_eq!(batches.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_shutdown_shuts_driver_and_dead_letter_down() {
    let batches = Arc::new(Mutex::new(Vec::new()));
    let driver = RecordingOutput::new(Arc::clone(&batches));
    let driver_shutdowns = Arc::clone(&driver.shutdowns);
    let dl = RecordingOutput::new(Arc::new(Mutex::new(Vec::new())));
    let dl_shutdowns = Arc::clone(&dl.shutdowns);

    let mut stage = stage_with(
        driver,
        BatchSettings::default(),
        fast_retry(3),
        Some(Box::new(dl)),
    );
    stage.shutdown().await;

    assert_eq!(driver_shutdowns.load(Ordering::SeqCst), 1);
    assert_eq!(dl_shutdowns.load(Ordering::SeqCst), 1);
}
