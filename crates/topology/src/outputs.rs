//! Synchronous fan-out over multiple output stages
//!
//! When a plan configures more than one output, the per-worker link ends in
//! an `OutputsProcessor`: every event is handed to each output stage in
//! configuration order, one after the other. Parallelism comes from workers,
//! not from this fan-out; the per-worker pipeline stays single-threaded.

use async_trait::async_trait;
use hauler_event::Event;

use crate::{OutputStage, Processor};

/// Terminal processor fanning one event out to several output stages.
pub struct OutputsProcessor {
    outputs: Vec<OutputStage>,
}

impl OutputsProcessor {
    /// Compose output stages in configuration order.
    pub fn new(outputs: Vec<OutputStage>) -> Self {
        Self { outputs }
    }

    /// Number of composed outputs.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Whether there are no outputs (an empty fan-out consumes silently).
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Smallest configured batch interval, for the worker's tick period.
    pub fn min_batch_interval(&self) -> Option<std::time::Duration> {
        self.outputs.iter().map(|o| o.batch_interval()).min()
    }
}

#[async_trait]
impl Processor for OutputsProcessor {
    async fn process(&mut self, event: Event) -> Option<Event> {
        // Each recipient owns its copy; the last one takes the original.
        // The clone is structural fan-out, not a stage-level copy.
        let mut remaining = self.outputs.len();
        for output in &mut self.outputs {
            remaining -= 1;
            if remaining == 0 {
                output.process(event).await;
                break;
            }
            output.process(event.clone()).await;
        }
        None
    }

    async fn tick(&mut self) {
        for output in &mut self.outputs {
            output.tick().await;
        }
    }

    async fn shutdown(&mut self) {
        for output in &mut self.outputs {
            output.shutdown().await;
        }
    }
}

#[cfg(test)]
#[path = "outputs_test.rs"]
mod tests;
