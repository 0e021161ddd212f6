//! Tests for the supervisor

use std::time::Duration;

use serde_json::json;

use super::*;
use crate::test_util::{MemoryFeed, MemoryInput, collected, event, harness};

const PLAN_V1: &str = "inputs:\n  - memory: {}\noutputs:\n  - collect: {}\n";
const PLAN_V2: &str =
    "inputs:\n  - memory:\n      add_tags: [gen2]\noutputs:\n  - collect: {}\n";

fn settings() -> SupervisorSettings {
    SupervisorSettings {
        worker_count: 1,
        exit_when_nil: false,
        drain_deadline: Duration::from_secs(5),
    }
}

async fn wait_for_count(
    batches: &std::sync::Arc<std::sync::Mutex<Vec<Vec<hauler_event::Event>>>>,
    count: usize,
) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if collected(batches).len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "expected {count} events, saw {}",
            collected(batches).len()
        )
    });
}

struct Running {
    handle: tokio::task::JoinHandle<Result<(), PipelineError>>,
    cancel: tokio_util::sync::CancellationToken,
    reload: tokio::sync::mpsc::Sender<()>,
}

fn start(config_path: &std::path::Path, registry: std::sync::Arc<hauler_topology::Registry>) -> Running {
    let supervisor = Supervisor::new(config_path, registry, settings());
    let cancel = supervisor.cancel_token();
    let reload = supervisor.reload_handle();
    let handle = tokio::spawn(supervisor.run());
    Running {
        handle,
        cancel,
        reload,
    }
}

async fn finish(running: Running) {
    running.cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), running.handle)
        .await
        .expect("supervisor stops in time")
        .expect("supervisor task does not panic")
        .expect("supervisor exits cleanly");
}

#[tokio::test]
async fn test_startup_failure_is_fatal() {
    let h = harness(Vec::new());
    let supervisor = Supervisor::new("/definitely/not/here.yml", h.registry, settings());
    assert!(supervisor.run().await.is_err());
}

#[tokio::test]
async fn test_startup_unknown_driver_is_fatal() {
    let file = tempfile::NamedTempFile::with_suffix(".yml").unwrap();
    std::fs::write(file.path(), "inputs:\n  - kafka: {}\noutputs:\n  - collect: {}\n").unwrap();

    let h = harness(Vec::new());
    let supervisor = Supervisor::new(file.path(), h.registry, settings());
    assert!(supervisor.run().await.is_err());
}

#[tokio::test]
async fn test_events_flow_and_termination_drains() {
    let (input, feed) = MemoryInput::new();
    let h = harness(vec![input]);

    let file = tempfile::NamedTempFile::with_suffix(".yml").unwrap();
    std::fs::write(file.path(), PLAN_V1).unwrap();
    let running = start(file.path(), h.registry.clone());

    feed.push(event(json!({"n": 1}))).await;
    feed.push(event(json!({"n": 2}))).await;
    wait_for_count(&h.batches, 2).await;

    finish(running).await;
    assert_eq!(collected(&h.batches).len(), 2);
    assert_eq!(h.output_shutdowns.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_reload_with_bad_config_keeps_running_plan() {
    let (input, feed) = MemoryInput::new();
    let h = harness(vec![input]);

    let file = tempfile::NamedTempFile::with_suffix(".yml").unwrap();
    std::fs::write(file.path(), PLAN_V1).unwrap();
    let running = start(file.path(), h.registry.clone());

    feed.push(event(json!({"n": 1}))).await;
    wait_for_count(&h.batches, 1).await;

    // Break the config, then trigger a reload.
    std::fs::write(file.path(), "inputs: [broken\n").unwrap();
    running.reload.send(()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // The old generation still serves.
    feed.push(event(json!({"n": 2}))).await;
    wait_for_count(&h.batches, 2).await;

    finish(running).await;
}

#[tokio::test]
async fn test_reload_swaps_generations_atomically() {
    let (input_one, feed_one) = MemoryInput::new();
    let (input_two, feed_two) = MemoryInput::new();
    let h = harness(vec![input_one.clone(), input_two]);

    let file = tempfile::NamedTempFile::with_suffix(".yml").unwrap();
    std::fs::write(file.path(), PLAN_V1).unwrap();
    let running = start(file.path(), h.registry.clone());

    // First generation processes its events completely.
    for n in 0..5 {
        feed_one.push(event(json!({"n": n}))).await;
    }
    wait_for_count(&h.batches, 5).await;

    std::fs::write(file.path(), PLAN_V2).unwrap();
    running.reload.send(()).await.unwrap();

    // The new generation reads from the second input and tags its events.
    let pushed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            feed_two.push(event(json!({"m": 1}))).await;
            tokio::time::sleep(Duration::from_millis(10)).await;
            if collected(&h.batches).iter().any(|e| e.has_tag("gen2")) {
                break;
            }
        }
    })
    .await;
    assert!(pushed.is_ok(), "second generation never produced");

    // The old input was shut down exactly once by the reload.
    assert_eq!(input_one.shutdowns(), 1);

    // Events that went through generation one were never reprocessed:
    // every untagged event appears exactly once.
    let untagged = collected(&h.batches)
        .iter()
        .filter(|e| !e.has_tag("gen2"))
        .count();
    assert_eq!(untagged, 5);

    finish(running).await;
}

#[tokio::test]
async fn test_reload_triggers_coalesce() {
    let (input, feed) = MemoryInput::new();
    // Reloads pull fresh inputs from the queue; prepare plenty.
    let mut spares = vec![input];
    let mut spare_feeds: Vec<MemoryFeed> = Vec::new();
    for _ in 0..4 {
        let (spare, spare_feed) = MemoryInput::new();
        spares.push(spare);
        spare_feeds.push(spare_feed);
    }
    let h = harness(spares);

    let file = tempfile::NamedTempFile::with_suffix(".yml").unwrap();
    std::fs::write(file.path(), PLAN_V1).unwrap();
    let running = start(file.path(), h.registry.clone());

    feed.push(event(json!({"n": 1}))).await;
    wait_for_count(&h.batches, 1).await;

    // A burst of triggers coalesces into at most two reloads (one running,
    // one pending), never one per trigger.
    for _ in 0..10 {
        let _ = running.reload.try_send(());
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    finish(running).await;
}
