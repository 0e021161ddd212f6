//! Hauler - Inputs
//!
//! Built-in input drivers. An input is shared by every worker of its box:
//! drivers read from their source on a background task and hand events out
//! through a channel, which keeps `read_one` cancellation-safe.
//!
//! # Drivers
//!
//! | Type | Job |
//! |------|-----|
//! | `stdin` | read lines from standard input |
//! | `tcp` | line-oriented TCP listener |
//!
//! Both decode each line as a JSON object when possible, wrap it as
//! `{"message": line}` otherwise, and stamp `@timestamp` when absent.

mod codec;
mod stdin;
mod tcp;

pub use stdin::StdinInput;
pub use tcp::{TcpInput, TcpInputConfig};

use hauler_topology::Registry;

/// Register every built-in input driver.
pub fn register_builtins(registry: &mut Registry) {
    registry.register_input("stdin", |options| {
        Ok(std::sync::Arc::new(StdinInput::from_options(options)?))
    });
    registry.register_input("tcp", |options| {
        Ok(std::sync::Arc::new(TcpInput::from_options(options)?))
    });
}
