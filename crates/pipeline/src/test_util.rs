//! Test doubles shared by the pipeline unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hauler_event::Event;
use hauler_topology::{Input, Output, Processor, Registry};
use tokio::sync::{Mutex as AsyncMutex, mpsc};

/// Channel-backed input: tests push events, `close` ends the stream,
/// `shutdown` stops producing (buffered events still drain first).
pub(crate) struct MemoryInput {
    receiver: AsyncMutex<mpsc::Receiver<Event>>,
    cancel: tokio_util::sync::CancellationToken,
    shutdowns: AtomicU32,
}

/// Feeds a [`MemoryInput`] from the test body; dropping it (or calling
/// `close`) is the driver's end-of-stream.
#[derive(Clone)]
pub(crate) struct MemoryFeed {
    sender: mpsc::Sender<Event>,
}

impl MemoryInput {
    pub(crate) fn new() -> (Arc<Self>, MemoryFeed) {
        let (tx, rx) = mpsc::channel(1024);
        let input = Arc::new(Self {
            receiver: AsyncMutex::new(rx),
            cancel: tokio_util::sync::CancellationToken::new(),
            shutdowns: AtomicU32::new(0),
        });
        (input, MemoryFeed { sender: tx })
    }

    /// How many times the driver's shutdown was invoked.
    pub(crate) fn shutdowns(&self) -> u32 {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

impl MemoryFeed {
    pub(crate) async fn push(&self, event: Event) {
        self.sender.send(event).await.expect("input still open");
    }

    /// End of stream: the input hands out buffered events, then nil.
    pub(crate) fn close(self) {}
}

#[async_trait]
impl Input for MemoryInput {
    async fn read_one(&self) -> Option<Event> {
        let mut receiver = self.receiver.lock().await;
        tokio::select! {
            biased;
            event = receiver.recv() => event,
            _ = self.cancel.cancelled() => None,
        }
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        self.cancel.cancel();
    }
}

/// Output driver collecting batches into a shared sink.
pub(crate) struct CollectOutput {
    sink: Arc<Mutex<Vec<Vec<Event>>>>,
    shutdowns: Arc<AtomicU32>,
    fail_remaining: u32,
}

impl CollectOutput {
    pub(crate) fn new(sink: Arc<Mutex<Vec<Vec<Event>>>>, shutdowns: Arc<AtomicU32>) -> Self {
        Self {
            sink,
            shutdowns,
            fail_remaining: 0,
        }
    }
}

#[async_trait]
impl Output for CollectOutput {
    async fn emit(&mut self, events: &[Event]) -> bool {
        if self.fail_remaining > 0 {
            self.fail_remaining -= 1;
            return false;
        }
        self.sink.lock().expect("sink lock").push(events.to_vec());
        true
    }

    async fn shutdown(&mut self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Bare processor collecting single events (for direct link assembly).
pub(crate) struct CollectProcessor {
    pub(crate) sink: Arc<Mutex<Vec<Event>>>,
    pub(crate) shutdowns: Arc<AtomicU32>,
}

#[async_trait]
impl Processor for CollectProcessor {
    async fn process(&mut self, event: Event) -> Option<Event> {
        self.sink.lock().expect("sink lock").push(event);
        None
    }

    async fn shutdown(&mut self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Registry with the test drivers plus the sinks they write into.
///
/// - input `memory`: hands out prepared [`MemoryInput`]s in order
/// - output `collect`: every instance appends batches to the shared sink
pub(crate) struct TestHarness {
    pub(crate) registry: Arc<Registry>,
    pub(crate) batches: Arc<Mutex<Vec<Vec<Event>>>>,
    pub(crate) output_shutdowns: Arc<AtomicU32>,
}

pub(crate) fn harness(inputs: Vec<Arc<MemoryInput>>) -> TestHarness {
    let batches: Arc<Mutex<Vec<Vec<Event>>>> = Arc::new(Mutex::new(Vec::new()));
    let output_shutdowns = Arc::new(AtomicU32::new(0));
    let queue = Arc::new(Mutex::new(VecDeque::from(inputs)));

    let mut registry = Registry::new();
    let queue_for_factory = Arc::clone(&queue);
    registry.register_input("memory", move |_| {
        let input = queue_for_factory
            .lock()
            .expect("input queue lock")
            .pop_front()
            .expect("test prepared enough memory inputs");
        Ok(input as Arc<dyn Input>)
    });

    let sink = Arc::clone(&batches);
    let shutdowns = Arc::clone(&output_shutdowns);
    registry.register_output("collect", move |_| {
        Ok(Box::new(CollectOutput::new(
            Arc::clone(&sink),
            Arc::clone(&shutdowns),
        )))
    });

    TestHarness {
        registry: Arc::new(registry),
        batches,
        output_shutdowns,
    }
}

pub(crate) fn event(value: serde_json::Value) -> Event {
    match value {
        serde_json::Value::Object(map) => Event::from(map),
        _ => unreachable!("test events are objects"),
    }
}

/// Flatten collected batches into events in arrival order.
pub(crate) fn collected(batches: &Arc<Mutex<Vec<Vec<Event>>>>) -> Vec<Event> {
    batches
        .lock()
        .expect("sink lock")
        .iter()
        .flatten()
        .cloned()
        .collect()
}
