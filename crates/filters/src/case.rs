//! Case filters - lowercase / uppercase string fields

use hauler_event::{Event, Value};
use hauler_topology::{DriverOptions, Filter, Result, TopologyError, parse_driver_options};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CaseConfig {
    fields: Vec<String>,
}

impl CaseConfig {
    fn validated(kind: &str, options: &DriverOptions) -> Result<Vec<String>> {
        let config: CaseConfig = parse_driver_options("filter", kind, options)?;
        if config.fields.is_empty() {
            return Err(TopologyError::options(
                "filter",
                kind,
                "fields must not be empty",
            ));
        }
        Ok(config.fields)
    }
}

fn fold(event: &mut Event, fields: &[String], to_upper: bool) {
    for path in fields {
        // Missing or non-string fields are skipped, not failures.
        if let Some(Value::String(s)) = event.get(path) {
            let folded = if to_upper {
                s.to_uppercase()
            } else {
                s.to_lowercase()
            };
            event.set(path, folded);
        }
    }
}

/// Lowercases listed string fields. Always succeeds.
#[derive(Debug)]
pub struct LowercaseFilter {
    fields: Vec<String>,
}

impl LowercaseFilter {
    /// Build from plan options.
    pub fn from_options(options: &DriverOptions) -> Result<Self> {
        Ok(Self {
            fields: CaseConfig::validated("lowercase", options)?,
        })
    }
}

impl Filter for LowercaseFilter {
    fn filter(&mut self, mut event: Event) -> (Option<Event>, bool) {
        fold(&mut event, &self.fields, false);
        (Some(event), true)
    }
}

/// Uppercases listed string fields. Always succeeds.
#[derive(Debug)]
pub struct UppercaseFilter {
    fields: Vec<String>,
}

impl UppercaseFilter {
    /// Build from plan options.
    pub fn from_options(options: &DriverOptions) -> Result<Self> {
        Ok(Self {
            fields: CaseConfig::validated("uppercase", options)?,
        })
    }
}

impl Filter for UppercaseFilter {
    fn filter(&mut self, mut event: Event) -> (Option<Event>, bool) {
        fold(&mut event, &self.fields, true);
        (Some(event), true)
    }
}

#[cfg(test)]
#[path = "case_test.rs"]
mod tests;
