//! Split filter - divide a string field into named parts

use hauler_event::Event;
use hauler_topology::{DriverOptions, Filter, Result, TopologyError, parse_driver_options};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SplitConfig {
    field: String,
    separator: String,
    keys: Vec<String>,
    #[serde(default)]
    remove: bool,
}

/// Splits `field` by `separator` and writes the parts to `keys` in order.
///
/// Fails when the field is missing, not a string, or yields fewer parts
/// than keys; extra parts beyond the keys are ignored.
#[derive(Debug)]
pub struct SplitFilter {
    config: SplitConfig,
}

impl SplitFilter {
    /// Build from plan options.
    pub fn from_options(options: &DriverOptions) -> Result<Self> {
        let config: SplitConfig = parse_driver_options("filter", "split", options)?;
        if config.separator.is_empty() {
            return Err(TopologyError::options(
                "filter",
                "split",
                "separator must not be empty",
            ));
        }
        if config.keys.is_empty() {
            return Err(TopologyError::options(
                "filter",
                "split",
                "keys must not be empty",
            ));
        }
        Ok(Self { config })
    }
}

impl Filter for SplitFilter {
    fn filter(&mut self, mut event: Event) -> (Option<Event>, bool) {
        let Some(source) = event.get_str(&self.config.field) else {
            return (Some(event), false);
        };

        let parts: Vec<String> = source
            .split(self.config.separator.as_str())
            .map(str::to_string)
            .collect();
        if parts.len() < self.config.keys.len() {
            return (Some(event), false);
        }

        for (key, part) in self.config.keys.iter().zip(parts) {
            event.set(key, part);
        }
        if self.config.remove {
            event.remove(&self.config.field);
        }
        (Some(event), true)
    }
}

#[cfg(test)]
#[path = "split_test.rs"]
mod tests;
