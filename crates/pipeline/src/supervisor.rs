//! Supervisor - generation lifecycle, reload, termination
//!
//! Owns the set of input boxes built from one plan (a "generation") and
//! the single process-wide cancellation token. Reload triggers serialize
//! through a capacity-1 mailbox: extra triggers during a reload coalesce
//! into one follow-up. Between two successful reloads no event is ever
//! processed by both generations: the old one drains to `Stopped` before
//! the new one starts, and each generation owns its own driver instances.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use hauler_config::Plan;
use hauler_topology::Registry;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::builder;
use crate::error::PipelineError;
use crate::input_box::{BoxSettings, InputBox};

#[cfg(test)]
#[path = "supervisor_test.rs"]
mod tests;

/// Supervisor-level settings from the CLI.
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    /// Workers per input box.
    pub worker_count: usize,
    /// A nil event terminates the whole process.
    pub exit_when_nil: bool,
    /// Bound on waiting for a generation to drain.
    pub drain_deadline: Duration,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            worker_count: 1,
            exit_when_nil: false,
            drain_deadline: Duration::from_secs(30),
        }
    }
}

/// Explicit lifecycle state, for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SupervisorState {
    Idle,
    Reloading,
    Terminating,
}

/// One generation of input boxes and the plan that built them.
struct Generation {
    plan: Arc<Plan>,
    boxes: Vec<Arc<InputBox>>,
    handles: Vec<JoinHandle<()>>,
}

/// Top-level lifecycle manager.
pub struct Supervisor {
    config_path: PathBuf,
    registry: Arc<Registry>,
    settings: SupervisorSettings,
    cancel: CancellationToken,
    reload_tx: mpsc::Sender<()>,
    reload_rx: mpsc::Receiver<()>,
    state: SupervisorState,
}

impl Supervisor {
    /// Create a supervisor over a config path and a filled registry.
    pub fn new(
        config_path: impl Into<PathBuf>,
        registry: Arc<Registry>,
        settings: SupervisorSettings,
    ) -> Self {
        let (reload_tx, reload_rx) = mpsc::channel(1);
        Self {
            config_path: config_path.into(),
            registry,
            settings,
            cancel: CancellationToken::new(),
            reload_tx,
            reload_rx,
            state: SupervisorState::Idle,
        }
    }

    fn set_state(&mut self, next: SupervisorState) {
        debug!(from = ?self.state, to = ?next, "supervisor state change");
        self.state = next;
    }

    /// The process-wide cancellation token (signal handlers cancel it).
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Handle for reload triggers (signal handler, config watcher). A full
    /// mailbox means a reload is already pending; triggers coalesce.
    pub fn reload_handle(&self) -> mpsc::Sender<()> {
        self.reload_tx.clone()
    }

    /// Parse the plan, start the first generation, and supervise until the
    /// token is cancelled. Startup errors are fatal; reload errors are not.
    pub async fn run(mut self) -> Result<(), PipelineError> {
        let plan = Arc::new(Plan::from_path(&self.config_path)?);
        builder::validate_plan(&plan, &self.registry)?;
        let mut generation = self.start_generation(plan)?;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.set_state(SupervisorState::Terminating);
                    info!("termination requested");
                    break;
                }
                Some(()) = self.reload_rx.recv() => {
                    self.reload(&mut generation).await;
                }
            }
        }

        self.stop_generation(&mut generation).await;
        info!("supervisor stopped");
        Ok(())
    }

    /// Swap generations for a new plan; on any failure the running (or
    /// previous) plan keeps serving.
    async fn reload(&mut self, generation: &mut Generation) {
        self.set_state(SupervisorState::Reloading);
        info!(config = %self.config_path.display(), "reload triggered");

        let new_plan = match Plan::from_path(&self.config_path) {
            Ok(plan) => Arc::new(plan),
            Err(e) => {
                error!(error = %e, "could not parse config, ignoring reload");
                self.set_state(SupervisorState::Idle);
                return;
            }
        };
        if let Err(e) = builder::validate_plan(&new_plan, &self.registry) {
            error!(error = %e, "invalid plan, ignoring reload");
            self.set_state(SupervisorState::Idle);
            return;
        }

        info!("stopping current generation");
        let old_plan = Arc::clone(&generation.plan);
        self.stop_generation(generation).await;

        match self.start_generation(Arc::clone(&new_plan)) {
            Ok(next) => {
                *generation = next;
                info!(stages = new_plan.stage_count(), "new generation started");
            }
            Err(e) => {
                // Validation passed but instantiation failed (a port bind,
                // a file permission). Fall back to the plan that served.
                error!(error = %e, "new generation failed to start, rolling back");
                match self.start_generation(old_plan) {
                    Ok(previous) => {
                        *generation = previous;
                        warn!("previous generation restored");
                    }
                    Err(e) => {
                        error!(error = %e, "rollback failed, terminating");
                        self.cancel.cancel();
                    }
                }
            }
        }
        self.set_state(SupervisorState::Idle);
    }

    /// Build and start every box of a plan. On a part-way failure the
    /// already-built boxes are discarded before the error surfaces.
    fn start_generation(&self, plan: Arc<Plan>) -> Result<Generation, PipelineError> {
        let box_settings = BoxSettings {
            worker_count: self.settings.worker_count,
            exit_when_nil: self.settings.exit_when_nil,
        };

        let mut boxes = Vec::with_capacity(plan.inputs.len());
        for entry in &plan.inputs {
            match builder::build_box(entry, &plan, &self.registry, box_settings.clone(), &self.cancel)
            {
                Ok(built) => boxes.push(Arc::new(built)),
                Err(e) => {
                    let partial = boxes;
                    tokio::spawn(async move {
                        for b in partial {
                            b.discard().await;
                        }
                    });
                    return Err(e);
                }
            }
        }

        let handles = boxes
            .iter()
            .map(|b| tokio::spawn(Arc::clone(b).run()))
            .collect();

        Ok(Generation {
            plan,
            boxes,
            handles,
        })
    }

    /// Stop every box and wait for the generation to drain, bounded by the
    /// drain deadline. Workers that cannot drain in time are aborted and
    /// their buffered events are lost (at-least-once, loudly).
    async fn stop_generation(&self, generation: &mut Generation) {
        for b in &generation.boxes {
            b.shutdown().await;
        }

        let mut handles = std::mem::take(&mut generation.handles);
        let drain = async {
            for handle in handles.iter_mut() {
                if let Err(e) = handle.await
                    && !e.is_cancelled()
                {
                    error!(error = %e, "input box task panicked");
                }
            }
        };

        if tokio::time::timeout(self.settings.drain_deadline, drain)
            .await
            .is_err()
        {
            warn!(
                deadline_secs = self.settings.drain_deadline.as_secs(),
                "generation did not drain within deadline, aborting remaining workers"
            );
            // Aborting already-finished tasks is a no-op.
            for handle in &handles {
                handle.abort();
            }
        }
        generation.boxes.clear();
    }
}
