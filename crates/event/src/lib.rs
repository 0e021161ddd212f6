//! Hauler - Event
//!
//! The unit of data flowing through the pipeline: a mutable nested mapping
//! from string keys to JSON-like values.
//!
//! # Design
//!
//! - **Owned, not shared**: an event belongs to exactly one worker at a time;
//!   stages hand it downstream by move.
//! - **Total path API**: stages access fields through `get`/`set`/`remove`
//!   with dotted paths (`a.b.0.c`) instead of raw type switches. Every
//!   operation is total over missing fields.
//! - **Implicit tags**: the top-level `tags` field (array of strings) carries
//!   routing markers such as filter failure tags.

mod event;
mod path;

pub use event::{Event, TAGS_FIELD, TIMESTAMP_FIELD};

pub use serde_json::{Map, Value};
