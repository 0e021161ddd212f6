//! Drop filter - discard events
//!
//! Drops every event that reaches it; selection belongs in the stage's
//! `if` gate.

use hauler_event::Event;
use hauler_topology::{DriverOptions, Filter, Result, parse_driver_options};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DropConfig {}

/// Unconditional drop.
#[derive(Debug, Default)]
pub struct DropFilter;

impl DropFilter {
    /// Build from plan options (the driver takes none).
    pub fn from_options(options: &DriverOptions) -> Result<Self> {
        let _: DropConfig = parse_driver_options("filter", "drop", options)?;
        Ok(Self)
    }
}

impl Filter for DropFilter {
    fn filter(&mut self, _event: Event) -> (Option<Event>, bool) {
        (None, true)
    }
}
