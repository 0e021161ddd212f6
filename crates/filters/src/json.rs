//! JSON filter - parse a string field into structured data

use hauler_event::{Event, Value};
use hauler_topology::{DriverOptions, Filter, Result, parse_driver_options};
use serde::Deserialize;

fn default_field() -> String {
    "message".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct JsonConfig {
    /// String field holding the JSON document.
    field: String,
    /// Where the parsed value lands; without a target the document must be
    /// an object and its keys merge at the event root.
    target: Option<String>,
    /// Keep the source field after a successful parse.
    preserve: bool,
}

impl Default for JsonConfig {
    fn default() -> Self {
        Self {
            field: default_field(),
            target: None,
            preserve: false,
        }
    }
}

/// Parses a JSON document out of a string field.
///
/// Fails when the field is missing, is not a string, does not parse, or is
/// not an object while merging at the root.
#[derive(Debug)]
pub struct JsonFilter {
    config: JsonConfig,
}

impl JsonFilter {
    /// Build from plan options.
    pub fn from_options(options: &DriverOptions) -> Result<Self> {
        let config: JsonConfig = parse_driver_options("filter", "json", options)?;
        Ok(Self { config })
    }
}

impl Filter for JsonFilter {
    fn filter(&mut self, mut event: Event) -> (Option<Event>, bool) {
        let Some(source) = event.get_str(&self.config.field) else {
            return (Some(event), false);
        };

        let parsed: Value = match serde_json::from_str(source) {
            Ok(value) => value,
            Err(_) => return (Some(event), false),
        };

        match (&self.config.target, parsed) {
            (Some(target), value) => {
                if !self.config.preserve {
                    event.remove(&self.config.field);
                }
                event.set(target, value);
            }
            (None, Value::Object(map)) => {
                if !self.config.preserve {
                    event.remove(&self.config.field);
                }
                for (key, value) in map {
                    event.set(&key, value);
                }
            }
            // Scalars and arrays have nowhere to merge at the root.
            (None, _) => return (Some(event), false),
        }

        (Some(event), true)
    }
}

#[cfg(test)]
#[path = "json_test.rs"]
mod tests;
