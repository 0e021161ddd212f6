//! Hauler - Condition
//!
//! The textual predicate language every stage shares for its `if` gate.
//! A condition compiles to a pure function `Event -> bool`.
//!
//! # Language
//!
//! Predicates compose with `!`, `&&`, `||` and parentheses:
//!
//! | Form | Semantics |
//! |------|-----------|
//! | `EQ(path, value)` | field equals a literal |
//! | `IN(path, [v, ...])` | field is one of the literals |
//! | `Exist(path)` | field is present |
//! | `HasPrefix(path, "s")` | string field starts with `s` |
//! | `Match(path, "re")` | string field matches a regex |
//! | `Before(dur)` / `After(dur)` | event timestamp vs `now + dur` |
//!
//! Compilation is strict: unknown predicates, malformed literals, bad
//! regexes or durations, and trailing input all fail. Evaluation never
//! mutates the event; operators treat missing fields as non-matching.
//!
//! # Example
//!
//! ```
//! use hauler_condition::Condition;
//! use hauler_event::Event;
//!
//! let cond = Condition::parse(r#"EQ(level, "debug") && !Exist(keep)"#).unwrap();
//! let mut event = Event::new();
//! event.set("level", "debug");
//! assert!(cond.eval(&event));
//! ```

mod ast;
mod duration;
mod error;
mod lexer;
mod parser;

pub use error::ConditionError;

use hauler_event::Event;

use crate::ast::Expr;

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;

/// A compiled condition expression.
pub struct Condition {
    source: String,
    expr: Expr,
}

impl Condition {
    /// Compile a condition from its textual form.
    pub fn parse(source: &str) -> Result<Self, ConditionError> {
        let expr = parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// Evaluate against an event. Pure: the event is only read.
    pub fn eval(&self, event: &Event) -> bool {
        self.expr.eval(event)
    }

    /// The original textual form (for logs and errors).
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Condition").field(&self.source).finish()
    }
}

/// The compiled AND of a stage's `if` conditions.
///
/// An empty gate passes everything; a failed gate means the stage is
/// skipped entirely and the event continues unchanged.
#[derive(Debug, Default)]
pub struct Gate {
    conditions: Vec<Condition>,
}

impl Gate {
    /// Compile a gate from condition sources. Any compile error aborts
    /// plan construction.
    pub fn compile<S: AsRef<str>>(sources: &[S]) -> Result<Self, ConditionError> {
        let conditions = sources
            .iter()
            .map(|s| Condition::parse(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { conditions })
    }

    /// A gate with no conditions (passes everything).
    pub fn pass_all() -> Self {
        Self::default()
    }

    /// True when every condition holds (vacuously true when empty).
    pub fn eval(&self, event: &Event) -> bool {
        self.conditions.iter().all(|c| c.eval(event))
    }

    /// Number of compiled conditions.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Whether the gate has no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}
