//! Condition compile errors
//!
//! All variants are compile-time: evaluation itself is total.

use thiserror::Error;

/// Errors produced while compiling a condition expression.
#[derive(Debug, Error)]
pub enum ConditionError {
    /// A character the lexer cannot place
    #[error("unexpected character '{ch}' at byte {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    /// A token out of place for the grammar
    #[error("expected {expected} at byte {pos}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        pos: usize,
    },

    /// Input ended mid-expression
    #[error("unexpected end of condition")]
    UnexpectedEnd,

    /// Complete expression followed by more input
    #[error("trailing input at byte {pos}")]
    TrailingInput { pos: usize },

    /// Predicate name outside the enumerated set
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    /// A literal that is not a valid value
    #[error("invalid value literal '{0}'")]
    InvalidValue(String),

    /// Regex for `Match` failed to compile
    #[error("invalid regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Duration for `Before`/`After` failed to parse
    #[error("invalid duration '{0}' (expected e.g. \"10s\", \"-24h\", \"1h30m\")")]
    InvalidDuration(String),
}
