//! Driver registry - configuration-driven driver creation
//!
//! Maps driver-type strings (`"stdin"`, `"drop"`, `"file"`) to factory
//! functions, one namespace per capability. Registration happens before the
//! supervisor starts; the registry is read-only during execution.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{Filter, Input, Output, Result, TopologyError};

/// The driver-specific option mapping from a plan entry, as parsed YAML.
/// Factories interpret it with serde; unknown options are theirs to reject.
pub type DriverOptions = serde_yaml::Mapping;

type InputFactory = Box<dyn Fn(&DriverOptions) -> Result<Arc<dyn Input>> + Send + Sync>;
type FilterFactory = Box<dyn Fn(&DriverOptions) -> Result<Box<dyn Filter>> + Send + Sync>;
type OutputFactory = Box<dyn Fn(&DriverOptions) -> Result<Box<dyn Output>> + Send + Sync>;

/// Registry of driver factories keyed by type string.
#[derive(Default)]
pub struct Registry {
    inputs: HashMap<String, InputFactory>,
    filters: HashMap<String, FilterFactory>,
    outputs: HashMap<String, OutputFactory>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an input driver factory.
    ///
    /// Input instances are shared across a box's workers, hence the `Arc`.
    ///
    /// # Panics
    /// Panics if the type name is already registered.
    pub fn register_input<F>(&mut self, type_name: &str, factory: F)
    where
        F: Fn(&DriverOptions) -> Result<Arc<dyn Input>> + Send + Sync + 'static,
    {
        if self
            .inputs
            .insert(type_name.to_string(), Box::new(factory))
            .is_some()
        {
            panic!("input driver '{type_name}' already registered");
        }
    }

    /// Register a filter driver factory.
    ///
    /// # Panics
    /// Panics if the type name is already registered.
    pub fn register_filter<F>(&mut self, type_name: &str, factory: F)
    where
        F: Fn(&DriverOptions) -> Result<Box<dyn Filter>> + Send + Sync + 'static,
    {
        if self
            .filters
            .insert(type_name.to_string(), Box::new(factory))
            .is_some()
        {
            panic!("filter driver '{type_name}' already registered");
        }
    }

    /// Register an output driver factory.
    ///
    /// # Panics
    /// Panics if the type name is already registered.
    pub fn register_output<F>(&mut self, type_name: &str, factory: F)
    where
        F: Fn(&DriverOptions) -> Result<Box<dyn Output>> + Send + Sync + 'static,
    {
        if self
            .outputs
            .insert(type_name.to_string(), Box::new(factory))
            .is_some()
        {
            panic!("output driver '{type_name}' already registered");
        }
    }

    /// Instantiate an input driver.
    pub fn build_input(&self, type_name: &str, options: &DriverOptions) -> Result<Arc<dyn Input>> {
        match self.inputs.get(type_name) {
            Some(factory) => factory(options),
            None => Err(self.unknown("input", type_name, self.inputs.keys())),
        }
    }

    /// Instantiate a filter driver.
    pub fn build_filter(&self, type_name: &str, options: &DriverOptions) -> Result<Box<dyn Filter>> {
        match self.filters.get(type_name) {
            Some(factory) => factory(options),
            None => Err(self.unknown("filter", type_name, self.filters.keys())),
        }
    }

    /// Instantiate an output driver.
    pub fn build_output(&self, type_name: &str, options: &DriverOptions) -> Result<Box<dyn Output>> {
        match self.outputs.get(type_name) {
            Some(factory) => factory(options),
            None => Err(self.unknown("output", type_name, self.outputs.keys())),
        }
    }

    /// Whether a driver type is registered for the given kind.
    pub fn contains(&self, kind: &str, type_name: &str) -> bool {
        match kind {
            "input" => self.inputs.contains_key(type_name),
            "filter" => self.filters.contains_key(type_name),
            "output" => self.outputs.contains_key(type_name),
            _ => false,
        }
    }

    /// Error unless a driver type is registered for the given kind.
    ///
    /// Lets plan validation report unknown drivers without instantiating
    /// anything.
    pub fn ensure_known(&self, kind: &'static str, type_name: &str) -> Result<()> {
        let err = match kind {
            "input" => {
                if self.inputs.contains_key(type_name) {
                    return Ok(());
                }
                self.unknown(kind, type_name, self.inputs.keys())
            }
            "filter" => {
                if self.filters.contains_key(type_name) {
                    return Ok(());
                }
                self.unknown(kind, type_name, self.filters.keys())
            }
            _ => {
                if self.outputs.contains_key(type_name) {
                    return Ok(());
                }
                self.unknown("output", type_name, self.outputs.keys())
            }
        };
        Err(err)
    }

    fn unknown<'a>(
        &self,
        kind: &'static str,
        name: &str,
        available: impl Iterator<Item = &'a String>,
    ) -> TopologyError {
        let mut names: Vec<&str> = available.map(|s| s.as_str()).collect();
        names.sort_unstable();
        TopologyError::UnknownDriver {
            kind,
            name: name.to_string(),
            available: names.join(", "),
        }
    }
}

/// Parse a driver's option mapping into its typed config with serde.
///
/// The shared stage options are already peeled off by the config layer, so
/// everything left either belongs to the driver or is a typo the driver's
/// `deny_unknown_fields` turns into a construction error.
pub fn parse_driver_options<T: serde::de::DeserializeOwned>(
    kind: &'static str,
    name: &str,
    options: &DriverOptions,
) -> Result<T> {
    serde_yaml::from_value(serde_yaml::Value::Mapping(options.clone()))
        .map_err(|e| TopologyError::options(kind, name, e.to_string()))
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("inputs", &self.inputs.len())
            .field("filters", &self.filters.len())
            .field("outputs", &self.outputs.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
