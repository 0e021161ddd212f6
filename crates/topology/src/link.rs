//! Processor link - one worker's chain of stages
//!
//! Stages are walked in configuration order; each hands the event to the
//! next by move. The first `None` stops the walk and the event's storage is
//! reclaimed on the spot. Two identical links produce identical outputs for
//! the same input.

use hauler_event::Event;

use crate::Processor;

/// A per-worker chain of processors terminating in output stage(s).
///
/// Constructed at input-box start, torn down with it. Never shared between
/// workers: every worker gets its own materialized link with its own driver
/// instances.
pub struct Link {
    stages: Vec<Box<dyn Processor>>,
}

impl Link {
    /// Build a link from stages in configuration order.
    pub fn new(stages: Vec<Box<dyn Processor>>) -> Self {
        Self { stages }
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the link has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Feed one event to the head of the link.
    pub async fn process(&mut self, event: Event) {
        let mut current = event;
        for stage in &mut self.stages {
            match stage.process(current).await {
                Some(next) => current = next,
                None => return,
            }
        }
    }

    /// Drive periodic maintenance (interval flushes) through every stage.
    pub async fn tick(&mut self) {
        for stage in &mut self.stages {
            stage.tick().await;
        }
    }

    /// Shut the link down in order: filters first, outputs last, so
    /// buffered events drain through drivers that are still alive.
    pub async fn shutdown(&mut self) {
        for stage in &mut self.stages {
            stage.shutdown().await;
        }
    }
}

#[cfg(test)]
#[path = "link_test.rs"]
mod tests;
