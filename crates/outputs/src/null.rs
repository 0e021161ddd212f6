//! Null output - discard everything
//!
//! Counts what it swallows and nothing else. Useful for benchmarking a
//! topology without sink I/O, and as the standard dead-letter target when
//! exhausted batches should vanish deliberately.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use hauler_event::Event;
use hauler_topology::{DriverOptions, Output, Result, parse_driver_options};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NullConfig {}

/// Discards every batch, successfully.
#[derive(Debug, Default)]
pub struct NullOutput {
    events: AtomicU64,
    batches: AtomicU64,
}

impl NullOutput {
    /// Build from plan options (the driver takes none).
    pub fn from_options(options: &DriverOptions) -> Result<Self> {
        let _: NullConfig = parse_driver_options("output", "null", options)?;
        Ok(Self::default())
    }

    /// Events swallowed so far.
    pub fn events(&self) -> u64 {
        self.events.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Output for NullOutput {
    async fn emit(&mut self, events: &[Event]) -> bool {
        self.events.fetch_add(events.len() as u64, Ordering::Relaxed);
        self.batches.fetch_add(1, Ordering::Relaxed);
        true
    }

    async fn shutdown(&mut self) {
        info!(
            events = self.events.load(Ordering::Relaxed),
            batches = self.batches.load(Ordering::Relaxed),
            "null output discarded"
        );
    }
}
