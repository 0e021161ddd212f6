//! Filter stage - gate, driver body, post-actions, failure tagging

use async_trait::async_trait;
use hauler_condition::Gate;
use hauler_event::{Event, Value};
use tracing::trace;

use crate::{Filter, Processor};

/// The shared add/remove post-actions every stage entry supports.
///
/// Additions run before removals so a stage may add something an earlier
/// stage's removal list no longer sees.
#[derive(Debug, Default)]
pub struct StageActions {
    pub add_fields: Vec<(String, Value)>,
    pub remove_fields: Vec<String>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
}

impl StageActions {
    /// Whether there is anything to apply.
    pub fn is_empty(&self) -> bool {
        self.add_fields.is_empty()
            && self.remove_fields.is_empty()
            && self.add_tags.is_empty()
            && self.remove_tags.is_empty()
    }

    /// Apply additions, then removals.
    pub fn apply(&self, event: &mut Event) {
        for (path, value) in &self.add_fields {
            if !event.set(path, value.clone()) {
                trace!(field = %path, "add_fields path blocked, skipping");
            }
        }
        for tag in &self.add_tags {
            event.add_tag(tag);
        }
        for path in &self.remove_fields {
            event.remove(path);
        }
        for tag in &self.remove_tags {
            event.remove_tag(tag);
        }
    }
}

/// Wraps a filter driver in the [`Processor`] contract.
///
/// Per event: gate miss skips the stage entirely (no post-actions); driver
/// success applies the post-actions and clears the failure tag; driver
/// failure appends the failure tag (when configured) and forwards the event
/// untouched otherwise.
pub struct FilterStage {
    name: String,
    driver: Box<dyn Filter>,
    gate: Gate,
    actions: StageActions,
    fail_tag: Option<String>,
}

impl FilterStage {
    /// Wrap a filter driver.
    pub fn new(
        name: impl Into<String>,
        driver: Box<dyn Filter>,
        gate: Gate,
        actions: StageActions,
        fail_tag: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            driver,
            gate,
            actions,
            fail_tag,
        }
    }

    /// Driver type, for logs.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Processor for FilterStage {
    async fn process(&mut self, event: Event) -> Option<Event> {
        if !self.gate.eval(&event) {
            return Some(event);
        }

        let (event, success) = self.driver.filter(event);
        let mut event = event?;

        if success {
            // A later success clears the failure marker so downstream
            // stages can detect recovery.
            if let Some(tag) = &self.fail_tag {
                event.remove_tag(tag);
            }
            self.actions.apply(&mut event);
        } else if let Some(tag) = &self.fail_tag {
            event.add_tag(tag);
        }

        Some(event)
    }

    async fn shutdown(&mut self) {
        self.driver.shutdown();
        trace!(driver = %self.name, "filter driver shut down");
    }
}

#[cfg(test)]
#[path = "filter_stage_test.rs"]
mod tests;
