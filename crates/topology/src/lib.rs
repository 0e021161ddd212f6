//! Hauler - Topology
//!
//! The runtime that composes heterogeneous stage implementations behind one
//! contract: filter stages that enrich, reshape or drop events, and output
//! stages that batch and emit them.
//!
//! # Architecture
//!
//! ```text
//! [Input] → read_one → [FilterStage] → ... → [FilterStage] → [Output stage(s)]
//!                       gate + driver          gate + driver    gate + batch + retry
//! ```
//!
//! Every worker owns its own materialized [`Link`]; no stage is ever entered
//! by two workers concurrently. Handoff between stages is a move, and a
//! `None` return drops the event on the spot.
//!
//! # Design
//!
//! - **One contract**: [`Processor`] is `process(event) -> Option<event>`
//!   plus `tick` (periodic flush opportunity) and `shutdown` (drain + driver
//!   teardown), all driven by the owning worker.
//! - **Capability sets, not a base class**: [`Input`], [`Filter`] and
//!   [`Output`] are independent traits; the [`Registry`] maps driver-type
//!   strings to factories returning them.
//! - **Fan-out is structural**: multiple outputs compose as an
//!   [`OutputsProcessor`] that calls each output in configuration order;
//!   stages themselves never clone to fan out.

mod backoff;
mod error;
mod filter_stage;
mod link;
mod output_stage;
mod outputs;
mod registry;

pub use backoff::ExponentialBackoff;
pub use error::TopologyError;
pub use filter_stage::{FilterStage, StageActions};
pub use link::Link;
pub use output_stage::{BatchSettings, OutputMetrics, OutputStage, RetrySettings};
pub use outputs::OutputsProcessor;
pub use registry::{DriverOptions, Registry, parse_driver_options};

use async_trait::async_trait;
use hauler_event::Event;

/// Result alias for topology operations.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// The uniform stage contract.
///
/// A processor accepts one event and emits zero or one event downstream.
/// Returning the event (possibly mutated) forwards it; returning `None`
/// drops it silently. A processor must not reference an event after it has
/// been passed downstream.
#[async_trait]
pub trait Processor: Send {
    /// Process one event.
    async fn process(&mut self, event: Event) -> Option<Event>;

    /// Periodic maintenance driven by the worker loop; output stages use it
    /// to honor `batch_interval`.
    async fn tick(&mut self) {}

    /// Flush buffered data and shut the wrapped driver down. Called exactly
    /// once, by the worker that owns the link.
    async fn shutdown(&mut self);
}

/// An input driver: the head of a box's event stream.
///
/// One instance is shared by all workers of an input box, so implementations
/// are `Sync` and typically hand out events from an internal channel.
/// `read_one` futures must be cancellation-safe (drop without losing an
/// event); backing them with a channel receive satisfies this.
#[async_trait]
pub trait Input: Send + Sync {
    /// Pull the next event. `None` means "no more events from me" and
    /// triggers box shutdown.
    async fn read_one(&self) -> Option<Event>;

    /// Stop producing. Must unblock pending `read_one` calls (they return
    /// `None` from here on).
    async fn shutdown(&self);
}

/// A filter driver: the CPU-only body of a [`FilterStage`].
///
/// Returns the event (possibly mutated) together with a success flag.
/// `(None, true)` is an intentional drop; `(Some, false)` is a failure the
/// stage turns into a `failTag`. A driver must not retain references to the
/// event after return, and must not block on I/O.
pub trait Filter: Send {
    /// Run the filter body on one event.
    fn filter(&mut self, event: Event) -> (Option<Event>, bool);

    /// Release driver resources. Default: nothing to do.
    fn shutdown(&mut self) {}
}

/// An output driver: emits events to an external sink.
///
/// `events` is a batch of one when batching is disabled. Each worker holds
/// its own instance, so concurrent `emit` calls never happen on one value.
#[async_trait]
pub trait Output: Send {
    /// Emit a batch in one call. Returns per-batch success.
    async fn emit(&mut self, events: &[Event]) -> bool;

    /// Flush and release driver resources.
    async fn shutdown(&mut self);
}
