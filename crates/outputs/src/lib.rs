//! Hauler - Outputs
//!
//! Built-in output drivers. An output receives whole batches (a batch of
//! one when batching is disabled) and reports per-batch success; the output
//! stage above it owns buffering, retries and dead-lettering.
//!
//! # Drivers
//!
//! | Type | Job |
//! |------|-----|
//! | `stdout` | one JSON line per event on standard output |
//! | `file` | append JSON lines to a file |
//! | `null` | discard (count only); the standard dead-letter target |

mod file;
mod null;
mod stdout;

pub use file::{FileOutput, FileOutputConfig};
pub use null::NullOutput;
pub use stdout::StdoutOutput;

use hauler_topology::Registry;

/// Register every built-in output driver.
pub fn register_builtins(registry: &mut Registry) {
    registry.register_output("stdout", |options| {
        Ok(Box::new(StdoutOutput::from_options(options)?))
    });
    registry.register_output("file", |options| {
        Ok(Box::new(FileOutput::from_options(options)?))
    });
    registry.register_output("null", |options| {
        Ok(Box::new(NullOutput::from_options(options)?))
    });
}
