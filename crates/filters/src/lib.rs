//! Hauler - Filters
//!
//! Built-in filter drivers. A filter runs CPU-only work on one event and
//! reports success or failure; drops are an intentional `(None, true)`.
//!
//! # Drivers
//!
//! | Type | Job |
//! |------|-----|
//! | `drop` | drop the event (pair with `if`) |
//! | `rename` | move fields to new paths |
//! | `lowercase` / `uppercase` | case-fold string fields |
//! | `split` | split a string field into named parts |
//! | `json` | parse a string field as JSON |
//! | `date` | parse a timestamp field through candidate formats |
//!
//! # Adding a driver
//!
//! 1. Config struct with serde (`deny_unknown_fields` so typos fail plan
//!    construction, not silently pass).
//! 2. Implement [`hauler_topology::Filter`].
//! 3. Register the factory in [`register_builtins`].

mod case;
mod date;
mod drop;
mod json;
mod rename;
mod split;

pub use case::{LowercaseFilter, UppercaseFilter};
pub use date::DateFilter;
pub use drop::DropFilter;
pub use json::JsonFilter;
pub use rename::RenameFilter;
pub use split::SplitFilter;

use hauler_topology::Registry;

/// Register every built-in filter driver.
pub fn register_builtins(registry: &mut Registry) {
    registry.register_filter("drop", |options| {
        Ok(Box::new(DropFilter::from_options(options)?))
    });
    registry.register_filter("rename", |options| {
        Ok(Box::new(RenameFilter::from_options(options)?))
    });
    registry.register_filter("lowercase", |options| {
        Ok(Box::new(LowercaseFilter::from_options(options)?))
    });
    registry.register_filter("uppercase", |options| {
        Ok(Box::new(UppercaseFilter::from_options(options)?))
    });
    registry.register_filter("split", |options| {
        Ok(Box::new(SplitFilter::from_options(options)?))
    });
    registry.register_filter("json", |options| {
        Ok(Box::new(JsonFilter::from_options(options)?))
    });
    registry.register_filter("date", |options| {
        Ok(Box::new(DateFilter::from_options(options)?))
    });
}
