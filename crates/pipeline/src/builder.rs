//! Plan → topology construction
//!
//! Turns the parsed plan into live stages: a worker link per worker, an
//! input box per `inputs` entry. Also hosts the instantiation-free
//! pre-validation the supervisor runs before tearing a generation down.

use std::sync::Arc;
use std::time::Duration;

use hauler_condition::Gate;
use hauler_config::{CommonOptions, Plan, StageEntry};
use hauler_event::Event;
use hauler_topology::{
    BatchSettings, Filter, FilterStage, Link, OutputStage, OutputsProcessor, Processor, Registry,
    RetrySettings, StageActions,
};
use tokio_util::sync::CancellationToken;

use crate::error::PipelineError;
use crate::input_box::{BoxSettings, InputBox};

/// Worker ticks at least this often so interval flushes stay timely.
const MIN_TICK: Duration = Duration::from_millis(100);
const MAX_TICK: Duration = Duration::from_secs(1);

#[cfg(test)]
#[path = "builder_test.rs"]
mod tests;

/// Check a plan against the registry without instantiating drivers:
/// driver types must be registered and every gate must compile.
///
/// The supervisor runs this before stopping the old generation, so a typo
/// in a reloaded config never takes the pipeline down.
pub fn validate_plan(plan: &Plan, registry: &Registry) -> Result<(), PipelineError> {
    let check = |kind: &'static str, entries: &[StageEntry]| -> Result<(), PipelineError> {
        for entry in entries {
            registry.ensure_known(kind, &entry.driver_type)?;
            Gate::compile(&entry.common.conditions).map_err(hauler_topology::TopologyError::from)?;
            if let Some(batch) = &entry.batch
                && let Some(dead_letter) = &batch.dead_letter
            {
                registry.ensure_known("output", &dead_letter.driver_type)?;
            }
        }
        Ok(())
    };

    check("input", &plan.inputs)?;
    check("filter", &plan.filters)?;
    check("output", &plan.outputs)?;
    Ok(())
}

/// Compile an entry's shared options into a gate and post-actions.
fn compile_common(common: &CommonOptions) -> Result<(Gate, StageActions), PipelineError> {
    let gate = Gate::compile(&common.conditions).map_err(hauler_topology::TopologyError::from)?;
    let actions = StageActions {
        add_fields: common.add_fields.clone(),
        remove_fields: common.remove_fields.clone(),
        add_tags: common.add_tags.clone(),
        remove_tags: common.remove_tags.clone(),
    };
    Ok((gate, actions))
}

/// Forwards untouched; carries an input entry's gate and post-actions at
/// the head of the link.
struct IdentityFilter;

impl Filter for IdentityFilter {
    fn filter(&mut self, event: Event) -> (Option<Event>, bool) {
        (Some(event), true)
    }
}

fn build_output_stage(
    entry: &StageEntry,
    registry: &Registry,
    cancel: &CancellationToken,
) -> Result<OutputStage, PipelineError> {
    let driver = registry.build_output(&entry.driver_type, &entry.options)?;
    let (gate, actions) = compile_common(&entry.common)?;

    let options = entry.batch.clone().unwrap_or_default();
    let batch = BatchSettings {
        size: options.batch_size,
        bytes: options.batch_bytes,
        interval: options.batch_interval,
    };
    let retry = RetrySettings {
        max_attempts: options.max_retries,
        min_backoff: options.retry_min_backoff,
        max_backoff: options.retry_max_backoff,
    };
    let dead_letter = options
        .dead_letter
        .as_ref()
        .map(|spec| registry.build_output(&spec.driver_type, &spec.options))
        .transpose()?;

    Ok(OutputStage::new(
        entry.driver_type.clone(),
        driver,
        gate,
        actions,
        batch,
        retry,
        dead_letter,
        cancel.clone(),
    ))
}

/// Materialize one worker's link: input-entry head actions, filter stages
/// in configuration order, then the output stage(s). Every call builds
/// fresh driver instances; links are never shared.
///
/// Returns the link and the tick period its interval flushes want.
pub fn build_worker_link(
    input_entry: &StageEntry,
    plan: &Plan,
    registry: &Registry,
    cancel: &CancellationToken,
) -> Result<(Link, Duration), PipelineError> {
    let mut stages: Vec<Box<dyn Processor>> = Vec::new();

    // The input entry's own shared options apply to everything it reads.
    let (gate, actions) = compile_common(&input_entry.common)?;
    if !gate.is_empty() || !actions.is_empty() {
        stages.push(Box::new(FilterStage::new(
            format!("{}(head)", input_entry.driver_type),
            Box::new(IdentityFilter),
            gate,
            actions,
            None,
        )));
    }

    for entry in &plan.filters {
        let driver = registry.build_filter(&entry.driver_type, &entry.options)?;
        let (gate, actions) = compile_common(&entry.common)?;
        stages.push(Box::new(FilterStage::new(
            entry.driver_type.clone(),
            driver,
            gate,
            actions,
            entry.common.fail_tag.clone(),
        )));
    }

    let mut outputs = Vec::with_capacity(plan.outputs.len());
    for entry in &plan.outputs {
        outputs.push(build_output_stage(entry, registry, cancel)?);
    }

    let min_interval = outputs
        .iter()
        .map(OutputStage::batch_interval)
        .min()
        .unwrap_or(MAX_TICK);
    let tick = min_interval.clamp(MIN_TICK, MAX_TICK);

    if outputs.len() == 1 {
        let only = outputs.into_iter().next().expect("len checked");
        stages.push(Box::new(only));
    } else {
        stages.push(Box::new(OutputsProcessor::new(outputs)));
    }

    Ok((Link::new(stages), tick))
}

/// Build one input box from an `inputs` entry: the shared input driver
/// plus a materialized link per worker.
pub fn build_box(
    input_entry: &StageEntry,
    plan: &Arc<Plan>,
    registry: &Arc<Registry>,
    settings: BoxSettings,
    process_cancel: &CancellationToken,
) -> Result<InputBox, PipelineError> {
    let input = registry.build_input(&input_entry.driver_type, &input_entry.options)?;

    let cancel = process_cancel.child_token();
    let mut links = Vec::with_capacity(settings.worker_count);
    for _ in 0..settings.worker_count {
        links.push(build_worker_link(input_entry, plan, registry, &cancel)?);
    }

    Ok(InputBox::new(
        input_entry.driver_type.clone(),
        input,
        links,
        settings,
        process_cancel.clone(),
        cancel,
    ))
}
