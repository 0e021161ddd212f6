//! Pipeline error types

use thiserror::Error;

/// Errors raised while building or supervising a topology.
///
/// Everything here is a construction-time failure: fatal at startup,
/// logged and survived on reload. Runtime failures never become errors;
/// stages resolve them locally.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Plan could not be loaded or validated
    #[error(transparent)]
    Config(#[from] hauler_config::ConfigError),

    /// Stage or driver construction failed
    #[error(transparent)]
    Topology(#[from] hauler_topology::TopologyError),
}
