//! Stage entries - the single-key mappings of a plan
//!
//! Every entry is `driver_type: {options...}`. The shared options (`if`,
//! `add_fields`, `remove_fields`, `add_tags`, `remove_tags`, `failTag`) and
//! the output-only batching options are peeled off here; whatever remains
//! belongs to the driver and is delegated untouched.

use std::time::Duration;

use serde::Deserialize;
use serde_yaml::{Mapping, Value as Yaml};

use crate::error::{ConfigError, Result};

/// Which plan section an entry came from; decides which options are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Input,
    Filter,
    Output,
}

impl StageKind {
    /// Lowercase name for error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Input => "input",
            StageKind::Filter => "filter",
            StageKind::Output => "output",
        }
    }
}

/// Options shared by every stage entry.
#[derive(Debug, Default, Clone)]
pub struct CommonOptions {
    /// Condition sources, AND-combined into the stage gate.
    pub conditions: Vec<String>,
    /// Dotted path → value, applied on success.
    pub add_fields: Vec<(String, serde_json::Value)>,
    pub remove_fields: Vec<String>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
    /// Filter-only: tag applied on driver failure, cleared on success.
    pub fail_tag: Option<String>,
}

/// Output-only batching and retry options, consumed by the output stage
/// rather than the driver.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchOptions {
    pub batch_size: usize,
    pub batch_bytes: Option<usize>,
    #[serde(with = "humantime_serde")]
    pub batch_interval: Duration,
    pub max_retries: u32,
    #[serde(with = "humantime_serde")]
    pub retry_min_backoff: Duration,
    #[serde(with = "humantime_serde")]
    pub retry_max_backoff: Duration,
    #[serde(skip)]
    pub dead_letter: Option<DeadLetterSpec>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 1,
            batch_bytes: None,
            batch_interval: Duration::from_secs(5),
            max_retries: 3,
            retry_min_backoff: Duration::from_millis(500),
            retry_max_backoff: Duration::from_secs(30),
            dead_letter: None,
        }
    }
}

/// An output driver receiving batches that exhausted their retry budget.
#[derive(Debug, Clone)]
pub struct DeadLetterSpec {
    pub driver_type: String,
    pub options: Mapping,
}

/// One parsed plan entry: driver type, shared options, driver options.
#[derive(Debug, Clone)]
pub struct StageEntry {
    pub kind: StageKind,
    pub driver_type: String,
    pub common: CommonOptions,
    /// Present on outputs only.
    pub batch: Option<BatchOptions>,
    /// Driver-specific remainder.
    pub options: Mapping,
}

impl StageEntry {
    /// Parse a raw single-key mapping from the given plan section.
    pub(crate) fn parse(kind: StageKind, raw: Mapping) -> Result<Self> {
        if raw.len() != 1 {
            return Err(ConfigError::invalid(format!(
                "every {} entry must be a single-key mapping naming the driver type, got {} keys",
                kind.as_str(),
                raw.len()
            )));
        }

        let (key, value) = raw.into_iter().next().expect("len checked above");
        let driver_type = match key {
            Yaml::String(s) => s,
            other => {
                return Err(ConfigError::invalid(format!(
                    "{} driver type must be a string, got {}",
                    kind.as_str(),
                    type_name(&other)
                )));
            }
        };

        let mut options = match value {
            Yaml::Mapping(map) => map,
            // `- stdin:` with no options parses as null.
            Yaml::Null => Mapping::new(),
            other => {
                return Err(ConfigError::invalid(format!(
                    "options for {} '{driver_type}' must be a mapping, got {}",
                    kind.as_str(),
                    type_name(&other)
                )));
            }
        };

        let common = parse_common(kind, &driver_type, &mut options)?;
        let batch = match kind {
            StageKind::Output => Some(parse_batch(&driver_type, &mut options)?),
            _ => None,
        };

        Ok(Self {
            kind,
            driver_type,
            common,
            batch,
            options,
        })
    }
}

fn parse_common(kind: StageKind, driver: &str, options: &mut Mapping) -> Result<CommonOptions> {
    let mut common = CommonOptions::default();

    if let Some(value) = options.remove("if") {
        common.conditions = from_yaml(driver, "if", value)?;
    }
    if let Some(value) = options.remove("add_fields") {
        let fields: Mapping = from_yaml(driver, "add_fields", value)?;
        for (key, value) in fields {
            let path = match key {
                Yaml::String(s) => s,
                other => {
                    return Err(ConfigError::invalid(format!(
                        "add_fields keys for '{driver}' must be strings, got {}",
                        type_name(&other)
                    )));
                }
            };
            common.add_fields.push((path, yaml_to_json(value)?));
        }
    }
    if let Some(value) = options.remove("remove_fields") {
        common.remove_fields = from_yaml(driver, "remove_fields", value)?;
    }
    if let Some(value) = options.remove("add_tags") {
        common.add_tags = from_yaml(driver, "add_tags", value)?;
    }
    if let Some(value) = options.remove("remove_tags") {
        common.remove_tags = from_yaml(driver, "remove_tags", value)?;
    }
    if let Some(value) = options.remove("failTag") {
        if kind != StageKind::Filter {
            return Err(ConfigError::invalid(format!(
                "failTag is only valid on filters, found on {} '{driver}'",
                kind.as_str()
            )));
        }
        common.fail_tag = Some(from_yaml(driver, "failTag", value)?);
    }

    Ok(common)
}

const BATCH_KEYS: &[&str] = &[
    "batch_size",
    "batch_bytes",
    "batch_interval",
    "max_retries",
    "retry_min_backoff",
    "retry_max_backoff",
];

fn parse_batch(driver: &str, options: &mut Mapping) -> Result<BatchOptions> {
    let mut sub = Mapping::new();
    for &key in BATCH_KEYS {
        if let Some(value) = options.remove(key) {
            sub.insert(Yaml::String(key.to_string()), value);
        }
    }

    let mut batch: BatchOptions = serde_yaml::from_value(Yaml::Mapping(sub)).map_err(|e| {
        ConfigError::invalid(format!("invalid batching options for output '{driver}': {e}"))
    })?;

    if batch.batch_size == 0 {
        return Err(ConfigError::invalid(format!(
            "batch_size for output '{driver}' must be positive"
        )));
    }
    if batch.max_retries == 0 {
        return Err(ConfigError::invalid(format!(
            "max_retries for output '{driver}' must be positive"
        )));
    }

    if let Some(value) = options.remove("dead_letter") {
        let raw: Mapping = from_yaml(driver, "dead_letter", value)?;
        if raw.len() != 1 {
            return Err(ConfigError::invalid(format!(
                "dead_letter for output '{driver}' must be a single-key mapping"
            )));
        }
        let (key, value) = raw.into_iter().next().expect("len checked above");
        let driver_type = match key {
            Yaml::String(s) => s,
            other => {
                return Err(ConfigError::invalid(format!(
                    "dead_letter driver type for '{driver}' must be a string, got {}",
                    type_name(&other)
                )));
            }
        };
        let dl_options = match value {
            Yaml::Mapping(map) => map,
            Yaml::Null => Mapping::new(),
            other => {
                return Err(ConfigError::invalid(format!(
                    "dead_letter options for '{driver}' must be a mapping, got {}",
                    type_name(&other)
                )));
            }
        };
        batch.dead_letter = Some(DeadLetterSpec {
            driver_type,
            options: dl_options,
        });
    }

    Ok(batch)
}

fn from_yaml<T: serde::de::DeserializeOwned>(driver: &str, key: &str, value: Yaml) -> Result<T> {
    serde_yaml::from_value(value).map_err(|e| {
        ConfigError::invalid(format!("invalid '{key}' option for driver '{driver}': {e}"))
    })
}

/// Convert a YAML value into its JSON counterpart (events are JSON trees).
pub fn yaml_to_json(value: Yaml) -> Result<serde_json::Value> {
    use serde_json::Value as Json;
    Ok(match value {
        Yaml::Null => Json::Null,
        Yaml::Bool(b) => Json::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Json::from(i)
            } else if let Some(u) = n.as_u64() {
                Json::from(u)
            } else if let Some(f) = n.as_f64() {
                Json::from(f)
            } else {
                return Err(ConfigError::invalid(format!("unrepresentable number {n}")));
            }
        }
        Yaml::String(s) => Json::String(s),
        Yaml::Sequence(items) => {
            Json::Array(items.into_iter().map(yaml_to_json).collect::<Result<_>>()?)
        }
        Yaml::Mapping(map) => {
            let mut object = serde_json::Map::with_capacity(map.len());
            for (key, value) in map {
                let key = match key {
                    Yaml::String(s) => s,
                    other => {
                        return Err(ConfigError::invalid(format!(
                            "mapping keys must be strings, got {}",
                            type_name(&other)
                        )));
                    }
                };
                object.insert(key, yaml_to_json(value)?);
            }
            Json::Object(object)
        }
        Yaml::Tagged(_) => {
            return Err(ConfigError::invalid("YAML tags are not supported"));
        }
    })
}

fn type_name(value: &Yaml) -> &'static str {
    match value {
        Yaml::Null => "null",
        Yaml::Bool(_) => "a bool",
        Yaml::Number(_) => "a number",
        Yaml::String(_) => "a string",
        Yaml::Sequence(_) => "a sequence",
        Yaml::Mapping(_) => "a mapping",
        Yaml::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
#[path = "entry_test.rs"]
mod tests;
