//! Input box - one input driver, N worker chains
//!
//! Owns the shared input driver and a materialized link per worker.
//! Workers loop `read_one → link`, observing cancellation only between
//! reads so an in-flight event always finishes its walk. A nil event is
//! the driver's end-of-stream signal and shuts the box down; shutdown is
//! idempotent and reaches every underlying driver exactly once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use hauler_topology::{Input, Link};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Lifecycle states of an input box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxState {
    New,
    Running,
    Stopping,
    Stopped,
}

/// Per-box settings handed down from the CLI.
#[derive(Debug, Clone)]
pub struct BoxSettings {
    /// Worker links to materialize.
    pub worker_count: usize,
    /// A nil event terminates the whole process, not just this box.
    pub exit_when_nil: bool,
}

impl Default for BoxSettings {
    fn default() -> Self {
        Self {
            worker_count: 1,
            exit_when_nil: false,
        }
    }
}

/// One input driver plus its worker links.
pub struct InputBox {
    name: String,
    input: Arc<dyn Input>,
    /// Links with their tick periods, consumed by `run`.
    links: std::sync::Mutex<Vec<(Link, Duration)>>,
    settings: BoxSettings,
    /// Cancels the whole process (exit-when-nil).
    process_cancel: CancellationToken,
    /// Cancels this box's workers; child of the process token.
    cancel: CancellationToken,
    shutdown_started: AtomicBool,
    state_tx: watch::Sender<BoxState>,
    events_read: AtomicU64,
}

impl InputBox {
    /// Assemble a box from already-constructed parts (see
    /// [`crate::build_box`]).
    pub(crate) fn new(
        name: String,
        input: Arc<dyn Input>,
        links: Vec<(Link, Duration)>,
        settings: BoxSettings,
        process_cancel: CancellationToken,
        cancel: CancellationToken,
    ) -> Self {
        let (state_tx, _) = watch::channel(BoxState::New);
        Self {
            name,
            input,
            links: std::sync::Mutex::new(links),
            settings,
            process_cancel,
            cancel,
            shutdown_started: AtomicBool::new(false),
            state_tx,
            events_read: AtomicU64::new(0),
        }
    }

    /// Input driver type, for logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Observe the box lifecycle (`New → Running → Stopping → Stopped`).
    pub fn state(&self) -> watch::Receiver<BoxState> {
        self.state_tx.subscribe()
    }

    /// Events read from the input so far, across workers.
    pub fn events_read(&self) -> u64 {
        self.events_read.load(Ordering::Relaxed)
    }

    /// Run the box: spawn one worker per link and wait for all of them.
    ///
    /// Returns once every worker has drained and shut its link down; the
    /// state is `Stopped` from then on.
    pub async fn run(self: Arc<Self>) {
        let links = std::mem::take(&mut *self.links.lock().expect("links lock"));
        if links.is_empty() {
            warn!(input = %self.name, "input box has no workers");
            self.state_tx.send_replace(BoxState::Stopped);
            return;
        }

        self.state_tx.send_replace(BoxState::Running);
        info!(input = %self.name, workers = links.len(), "input box started");

        let mut workers = JoinSet::new();
        for (idx, (link, tick)) in links.into_iter().enumerate() {
            let this = Arc::clone(&self);
            workers.spawn(async move { this.worker(idx, link, tick).await });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!(input = %self.name, error = %e, "worker task panicked");
            }
        }

        // Normally a no-op: nil events and explicit shutdowns get here
        // first. Covers workers exiting on process cancellation alone.
        self.begin_shutdown().await;

        self.state_tx.send_replace(BoxState::Stopped);
        info!(
            input = %self.name,
            events = self.events_read.load(Ordering::Relaxed),
            "input box stopped"
        );
    }

    /// One worker: read, feed the link, tick the link on a timer.
    async fn worker(&self, idx: usize, mut link: Link, tick: Duration) {
        debug!(input = %self.name, worker = idx, "worker started");
        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            // Cancellation is observed here, between reads, never mid-walk.
            if self.cancel.is_cancelled() {
                break;
            }

            tokio::select! {
                event = self.input.read_one() => match event {
                    Some(event) => {
                        self.events_read.fetch_add(1, Ordering::Relaxed);
                        link.process(event).await;
                    }
                    None => {
                        if !self.cancel.is_cancelled() {
                            info!(input = %self.name, worker = idx, "nil event received, shutting box down");
                            self.begin_shutdown().await;
                            if self.settings.exit_when_nil {
                                info!(input = %self.name, "exit-when-nil set, terminating process");
                                self.process_cancel.cancel();
                            }
                        }
                        break;
                    }
                },
                _ = ticker.tick() => link.tick().await,
                _ = self.cancel.cancelled() => break,
            }
        }

        // Flush buffered batches and release this worker's driver
        // instances; each link shuts down exactly once, here.
        link.shutdown().await;
        debug!(input = %self.name, worker = idx, "worker stopped");
    }

    /// Idempotent shutdown entry: first caller stops the input driver and
    /// cancels the workers; everyone else returns immediately.
    ///
    /// Workers drain their in-flight event and shut their links down
    /// before the box reaches `Stopped`; await [`InputBox::run`] (or
    /// watch [`InputBox::state`]) for that.
    pub async fn shutdown(&self) {
        self.begin_shutdown().await;
    }

    async fn begin_shutdown(&self) {
        if self.shutdown_started.swap(true, Ordering::SeqCst) {
            return;
        }
        self.state_tx.send_replace(BoxState::Stopping);
        debug!(input = %self.name, "stopping input driver");
        self.input.shutdown().await;
        self.cancel.cancel();
    }

    /// Tear down a box that never ran (generation build failed part-way):
    /// stop the input and shut every prepared link down.
    pub(crate) async fn discard(&self) {
        self.begin_shutdown().await;
        let links = std::mem::take(&mut *self.links.lock().expect("links lock"));
        for (mut link, _) in links {
            link.shutdown().await;
        }
        self.state_tx.send_replace(BoxState::Stopped);
    }
}

#[cfg(test)]
#[path = "input_box_test.rs"]
mod tests;
