//! Hauler - Config
//!
//! YAML plan loading with strict validation. A plan is the immutable result
//! of parsing configuration: the blueprint for one generation of input
//! boxes. It is constructed at startup and on each reload, and discarded
//! atomically when replaced.
//!
//! # Shape
//!
//! ```yaml
//! inputs:
//!   - stdin: {}
//! filters:
//!   - drop:
//!       if:
//!         - 'EQ(level, "debug")'
//! outputs:
//!   - stdout:
//!       batch_size: 100
//!       batch_interval: 2s
//! ```
//!
//! Each entry is a single-key mapping whose key names the driver type. The
//! shared options (`if`, `add_fields`, `remove_fields`, `add_tags`,
//! `remove_tags`, `failTag`) are recognized on every entry; unknown
//! top-level keys are rejected; unknown driver options are delegated to the
//! driver.

mod entry;
mod error;
mod watcher;

pub use entry::{
    BatchOptions, CommonOptions, DeadLetterSpec, StageEntry, StageKind, yaml_to_json,
};
pub use error::{ConfigError, Result};
pub use watcher::ConfigWatcher;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;

/// Raw top-level shape; anything else at the top level is a parse error.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPlan {
    inputs: Vec<serde_yaml::Mapping>,
    #[serde(default)]
    filters: Vec<serde_yaml::Mapping>,
    outputs: Vec<serde_yaml::Mapping>,
}

/// A parsed, validated plan: three ordered stage sequences.
///
/// Immutable once built; the supervisor swaps whole plans on reload.
#[derive(Debug, Default)]
pub struct Plan {
    pub inputs: Vec<StageEntry>,
    pub filters: Vec<StageEntry>,
    pub outputs: Vec<StageEntry>,
}

impl Plan {
    /// Load a plan from a file, or from every `.yml`/`.yaml` file in a
    /// directory (lexical filename order, sequences concatenated).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let meta = fs::metadata(path).map_err(|e| ConfigError::io(path, e))?;

        if !meta.is_dir() {
            let contents = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
            return contents.parse();
        }

        let mut files: Vec<_> = fs::read_dir(path)
            .map_err(|e| ConfigError::io(path, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("yml") | Some("yaml")
                )
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(ConfigError::invalid(format!(
                "no .yml or .yaml files in directory '{}'",
                path.display()
            )));
        }

        let mut merged = Plan::default();
        for file in files {
            let contents = fs::read_to_string(&file).map_err(|e| ConfigError::io(&file, e))?;
            let plan = parse_sections(&contents)?;
            merged.inputs.extend(plan.inputs);
            merged.filters.extend(plan.filters);
            merged.outputs.extend(plan.outputs);
        }
        merged.validate()?;
        Ok(merged)
    }

    /// Number of stage entries across all sections.
    pub fn stage_count(&self) -> usize {
        self.inputs.len() + self.filters.len() + self.outputs.len()
    }

    fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(ConfigError::invalid("plan has no inputs"));
        }
        if self.outputs.is_empty() {
            return Err(ConfigError::invalid("plan has no outputs"));
        }
        Ok(())
    }
}

impl FromStr for Plan {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let plan = parse_sections(s)?;
        plan.validate()?;
        Ok(plan)
    }
}

/// Parse one document's sections without cross-section validation (the
/// directory loader validates after merging).
fn parse_sections(contents: &str) -> Result<Plan> {
    let raw: RawPlan = serde_yaml::from_str(contents)?;

    let parse_all = |kind: StageKind, entries: Vec<serde_yaml::Mapping>| {
        entries
            .into_iter()
            .map(|raw| StageEntry::parse(kind, raw))
            .collect::<Result<Vec<_>>>()
    };

    Ok(Plan {
        inputs: parse_all(StageKind::Input, raw.inputs)?,
        filters: parse_all(StageKind::Filter, raw.filters)?,
        outputs: parse_all(StageKind::Output, raw.outputs)?,
    })
}
