//! Rename filter - move fields to new paths

use hauler_event::Event;
use hauler_topology::{DriverOptions, Filter, Result, TopologyError, parse_driver_options};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RenameConfig {
    /// old path → new path, applied in configuration order.
    fields: serde_yaml::Mapping,
}

/// Moves fields; missing sources are skipped. Always succeeds.
#[derive(Debug)]
pub struct RenameFilter {
    fields: Vec<(String, String)>,
}

impl RenameFilter {
    /// Build from plan options.
    pub fn from_options(options: &DriverOptions) -> Result<Self> {
        let config: RenameConfig = parse_driver_options("filter", "rename", options)?;

        let mut fields = Vec::with_capacity(config.fields.len());
        for (old, new) in config.fields {
            match (old.as_str(), new.as_str()) {
                (Some(old), Some(new)) => fields.push((old.to_string(), new.to_string())),
                _ => {
                    return Err(TopologyError::options(
                        "filter",
                        "rename",
                        "fields must map string paths to string paths",
                    ));
                }
            }
        }
        if fields.is_empty() {
            return Err(TopologyError::options(
                "filter",
                "rename",
                "fields must not be empty",
            ));
        }
        Ok(Self { fields })
    }
}

impl Filter for RenameFilter {
    fn filter(&mut self, mut event: Event) -> (Option<Event>, bool) {
        for (old, new) in &self.fields {
            if let Some(value) = event.remove(old) {
                event.set(new, value);
            }
        }
        (Some(event), true)
    }
}

#[cfg(test)]
#[path = "rename_test.rs"]
mod tests;
