//! Hauler - Pipeline
//!
//! The lifecycle layer: input boxes that fan out worker chains over one
//! input driver, and the supervisor that owns the boxes across start,
//! hot-reload, drain and shutdown.
//!
//! # Architecture
//!
//! ```text
//!                 [Supervisor]  ← SIGUSR1 / watcher → reload mailbox
//!                 /          \
//!         [InputBox]      [InputBox]        one per `inputs` entry
//!         /    |    \          |
//!      [worker tasks]      [workers]        N per box, own Link each
//!        read_one → Link: filters → outputs
//! ```
//!
//! # Delivery contract
//!
//! At-least-once: shutdown waits for in-flight events, output buffers drain
//! through retries, and only retry exhaustion (or an unflushable buffer at
//! the drain deadline) loses data, loudly. Ordering holds within one worker
//! from read to every output; across workers and boxes there is none.

mod builder;
mod error;
mod input_box;
mod supervisor;

#[cfg(test)]
pub(crate) mod test_util;

pub use builder::{build_box, build_worker_link, validate_plan};
pub use error::PipelineError;
pub use input_box::{BoxSettings, BoxState, InputBox};
pub use supervisor::{Supervisor, SupervisorSettings};
