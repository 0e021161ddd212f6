//! Topology construction errors
//!
//! Everything here is fatal at plan-construction time; per-event and
//! per-batch failures never surface as errors (stages resolve them to
//! forward / drop / tag).

use thiserror::Error;

/// Errors raised while building stages and links from a plan.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// Driver type not present in the registry
    #[error("unknown {kind} driver '{name}', available: [{available}]")]
    UnknownDriver {
        kind: &'static str,
        name: String,
        available: String,
    },

    /// Driver rejected its option mapping
    #[error("invalid options for {kind} driver '{name}': {message}")]
    DriverOptions {
        kind: &'static str,
        name: String,
        message: String,
    },

    /// A stage's `if` condition failed to compile
    #[error("condition error: {0}")]
    Condition(#[from] hauler_condition::ConditionError),
}

impl TopologyError {
    /// Build a [`TopologyError::DriverOptions`].
    pub fn options(kind: &'static str, name: &str, message: impl Into<String>) -> Self {
        Self::DriverOptions {
            kind,
            name: name.to_string(),
            message: message.into(),
        }
    }
}
