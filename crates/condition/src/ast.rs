//! Compiled condition expressions and their evaluator

use chrono::{Duration, Utc};
use hauler_event::{Event, Value};
use regex::Regex;

/// Boolean expression tree.
#[derive(Debug)]
pub(crate) enum Expr {
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Pred(Pred),
}

/// Leaf predicates. Each defines its own missing-field behavior; all of
/// them treat a missing field as non-matching.
#[derive(Debug)]
pub(crate) enum Pred {
    Eq { path: String, value: Value },
    In { path: String, values: Vec<Value> },
    Exist { path: String },
    HasPrefix { path: String, prefix: String },
    Match { path: String, regex: Regex },
    Before { offset: Duration },
    After { offset: Duration },
}

impl Expr {
    pub(crate) fn eval(&self, event: &Event) -> bool {
        match self {
            Expr::Not(inner) => !inner.eval(event),
            Expr::And(lhs, rhs) => lhs.eval(event) && rhs.eval(event),
            Expr::Or(lhs, rhs) => lhs.eval(event) || rhs.eval(event),
            Expr::Pred(pred) => pred.eval(event),
        }
    }
}

impl Pred {
    fn eval(&self, event: &Event) -> bool {
        match self {
            Pred::Eq { path, value } => match event.get(path) {
                Some(field) => value_eq(field, value),
                None => false,
            },
            Pred::In { path, values } => match event.get(path) {
                Some(field) => values.iter().any(|v| value_eq(field, v)),
                None => false,
            },
            Pred::Exist { path } => event.get(path).is_some(),
            Pred::HasPrefix { path, prefix } => event
                .get_str(path)
                .is_some_and(|s| s.starts_with(prefix.as_str())),
            Pred::Match { path, regex } => {
                event.get_str(path).is_some_and(|s| regex.is_match(s))
            }
            Pred::Before { offset } => match event.timestamp() {
                Some(ts) => ts < Utc::now() + *offset,
                None => false,
            },
            Pred::After { offset } => match event.timestamp() {
                Some(ts) => ts > Utc::now() + *offset,
                None => false,
            },
        }
    }
}

/// Literal equality, with numbers compared by value so `1` matches `1.0`.
fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}
