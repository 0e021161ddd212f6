//! Date filter - normalize timestamps through candidate formats

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use hauler_event::{Event, TIMESTAMP_FIELD, Value};
use hauler_topology::{DriverOptions, Filter, Result, TopologyError, parse_driver_options};
use serde::Deserialize;

fn default_formats() -> Vec<String> {
    vec!["rfc3339".to_string()]
}

fn default_target() -> String {
    TIMESTAMP_FIELD.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DateConfig {
    /// Source field to parse.
    field: String,
    /// Formats tried in order: `rfc3339`, `unix`, `unix_ms`, or a chrono
    /// format string (`%Y-%m-%d %H:%M:%S`, assumed UTC without an offset).
    #[serde(default = "default_formats")]
    formats: Vec<String>,
    #[serde(default = "default_target")]
    target: String,
    /// Remove the source field after a successful parse.
    #[serde(default)]
    remove: bool,
}

/// Parses a timestamp field and writes it to `target` as RFC 3339.
///
/// Fails when the field is missing or no format matches.
#[derive(Debug)]
pub struct DateFilter {
    config: DateConfig,
}

impl DateFilter {
    /// Build from plan options.
    pub fn from_options(options: &DriverOptions) -> Result<Self> {
        let config: DateConfig = parse_driver_options("filter", "date", options)?;
        if config.formats.is_empty() {
            return Err(TopologyError::options(
                "filter",
                "date",
                "formats must not be empty",
            ));
        }
        Ok(Self { config })
    }

    fn parse(&self, value: &Value) -> Option<DateTime<Utc>> {
        for format in &self.config.formats {
            let parsed = match format.as_str() {
                "rfc3339" => value
                    .as_str()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|dt| dt.with_timezone(&Utc)),
                "unix" => as_i64(value).and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
                "unix_ms" => as_i64(value).and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
                pattern => value.as_str().and_then(|s| {
                    DateTime::parse_from_str(s, pattern)
                        .map(|dt| dt.with_timezone(&Utc))
                        .ok()
                        .or_else(|| {
                            NaiveDateTime::parse_from_str(s, pattern)
                                .ok()
                                .map(|naive| Utc.from_utc_datetime(&naive))
                        })
                }),
            };
            if parsed.is_some() {
                return parsed;
            }
        }
        None
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

impl Filter for DateFilter {
    fn filter(&mut self, mut event: Event) -> (Option<Event>, bool) {
        let Some(value) = event.get(&self.config.field) else {
            return (Some(event), false);
        };

        let Some(timestamp) = self.parse(value) else {
            return (Some(event), false);
        };

        if self.config.remove {
            event.remove(&self.config.field);
        }
        event.set(
            &self.config.target,
            timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        );
        (Some(event), true)
    }
}

#[cfg(test)]
#[path = "date_test.rs"]
mod tests;
