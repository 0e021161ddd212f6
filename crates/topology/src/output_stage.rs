//! Output stage - terminal processor with batching, retry and dead-letter
//!
//! Wraps an output driver with a buffer governed by three knobs: flush when
//! `batch_size` events are buffered, when the serialized size would exceed
//! `batch_bytes`, or when the oldest buffered event is `batch_interval` old
//! (observed on `tick`). Shutdown always flushes.
//!
//! A failed flush retries with jittered exponential backoff up to
//! `max_attempts`; the backoff sleep observes cancellation, but an emit
//! already handed to the driver is always awaited. After exhaustion the
//! batch goes to the dead-letter output when configured, else it is dropped
//! with a structured error log.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use hauler_condition::Gate;
use hauler_event::Event;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::filter_stage::StageActions;
use crate::{ExponentialBackoff, Output, Processor};

/// Batching knobs for one output stage.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// Flush when this many events are buffered. 1 disables batching.
    pub size: usize,
    /// Flush before the serialized batch would exceed this many bytes.
    pub bytes: Option<usize>,
    /// Flush at most this long after the oldest buffered event.
    pub interval: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            size: 1,
            bytes: None,
            interval: Duration::from_secs(5),
        }
    }
}

/// Retry policy for failed flushes.
#[derive(Debug, Clone)]
pub struct RetrySettings {
    /// Total emit attempts per batch (first try included).
    pub max_attempts: u32,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// Counters for one output stage instance, reported at shutdown.
#[derive(Debug, Default)]
pub struct OutputMetrics {
    pub events_in: AtomicU64,
    pub batches_flushed: AtomicU64,
    pub flush_failures: AtomicU64,
    pub retries: AtomicU64,
    pub events_dead_lettered: AtomicU64,
    pub events_dropped: AtomicU64,
}

impl OutputMetrics {
    fn record_flush(&self, ok: bool) {
        if ok {
            self.batches_flushed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.flush_failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Terminal [`Processor`] wrapping an output driver.
pub struct OutputStage {
    name: String,
    driver: Box<dyn Output>,
    gate: Gate,
    actions: StageActions,
    batch: BatchSettings,
    retry: RetrySettings,
    backoff: ExponentialBackoff,
    dead_letter: Option<Box<dyn Output>>,
    cancel: CancellationToken,
    buffer: Vec<Event>,
    buffered_bytes: usize,
    oldest: Option<Instant>,
    metrics: Arc<OutputMetrics>,
}

impl OutputStage {
    /// Wrap an output driver.
    pub fn new(
        name: impl Into<String>,
        driver: Box<dyn Output>,
        gate: Gate,
        actions: StageActions,
        batch: BatchSettings,
        retry: RetrySettings,
        dead_letter: Option<Box<dyn Output>>,
        cancel: CancellationToken,
    ) -> Self {
        let backoff = ExponentialBackoff::new(retry.min_backoff, retry.max_backoff);
        Self {
            name: name.into(),
            driver,
            gate,
            actions,
            batch,
            retry,
            backoff,
            dead_letter,
            cancel,
            buffer: Vec::new(),
            buffered_bytes: 0,
            oldest: None,
            metrics: Arc::new(OutputMetrics::default()),
        }
    }

    /// Driver type, for logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle to this stage's counters.
    pub fn metrics(&self) -> Arc<OutputMetrics> {
        Arc::clone(&self.metrics)
    }

    /// The configured flush interval (the worker derives its tick period
    /// from the smallest one across its outputs).
    pub fn batch_interval(&self) -> Duration {
        self.batch.interval
    }

    /// Hand the buffered batch to the driver, retrying per policy.
    ///
    /// The stage awaits each attempt before starting another, so at most
    /// one flush is ever in flight per instance.
    async fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.buffer);
        self.buffered_bytes = 0;
        self.oldest = None;

        let mut errors = 0u32;
        loop {
            if self.driver.emit(&batch).await {
                self.metrics.record_flush(true);
                debug!(driver = %self.name, events = batch.len(), "batch flushed");
                return;
            }

            errors += 1;
            self.metrics.record_flush(false);
            if errors >= self.retry.max_attempts {
                break;
            }

            let delay = self.backoff.duration(errors);
            warn!(
                driver = %self.name,
                attempt = errors,
                max_attempts = self.retry.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "emit failed, backing off"
            );
            self.metrics.retries.fetch_add(1, Ordering::Relaxed);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.cancel.cancelled() => {
                    // No time left to keep retrying; resolve the batch now.
                    debug!(driver = %self.name, "retry backoff cancelled");
                    break;
                }
            }
        }

        self.resolve_failed(batch).await;
    }

    /// Dead-letter or drop a batch that exhausted its retry budget.
    async fn resolve_failed(&mut self, batch: Vec<Event>) {
        if let Some(dead_letter) = self.dead_letter.as_mut() {
            if dead_letter.emit(&batch).await {
                self.metrics
                    .events_dead_lettered
                    .fetch_add(batch.len() as u64, Ordering::Relaxed);
                warn!(
                    driver = %self.name,
                    events = batch.len(),
                    "batch dead-lettered after retry exhaustion"
                );
                return;
            }
        }
        self.metrics
            .events_dropped
            .fetch_add(batch.len() as u64, Ordering::Relaxed);
        error!(
            driver = %self.name,
            events = batch.len(),
            attempts = self.retry.max_attempts,
            "batch dropped after retry exhaustion"
        );
    }
}

#[async_trait]
impl Processor for OutputStage {
    async fn process(&mut self, event: Event) -> Option<Event> {
        if !self.gate.eval(&event) {
            return None;
        }

        let mut event = event;
        self.actions.apply(&mut event);
        self.metrics.events_in.fetch_add(1, Ordering::Relaxed);

        if let Some(limit) = self.batch.bytes {
            let len = event.to_json_line().len();
            if !self.buffer.is_empty() && self.buffered_bytes + len > limit {
                self.flush().await;
            }
            self.buffered_bytes += len;
        }

        self.buffer.push(event);
        if self.oldest.is_none() {
            self.oldest = Some(Instant::now());
        }

        let over_size = self.buffer.len() >= self.batch.size;
        let over_bytes = self
            .batch
            .bytes
            .is_some_and(|limit| self.buffered_bytes >= limit);
        if over_size || over_bytes {
            self.flush().await;
        }

        None
    }

    async fn tick(&mut self) {
        if let Some(oldest) = self.oldest
            && oldest.elapsed() >= self.batch.interval
        {
            self.flush().await;
        }
    }

    async fn shutdown(&mut self) {
        self.flush().await;
        self.driver.shutdown().await;
        if let Some(dead_letter) = self.dead_letter.as_mut() {
            dead_letter.shutdown().await;
        }

        let m = &self.metrics;
        info!(
            driver = %self.name,
            events = m.events_in.load(Ordering::Relaxed),
            batches = m.batches_flushed.load(Ordering::Relaxed),
            flush_failures = m.flush_failures.load(Ordering::Relaxed),
            retries = m.retries.load(Ordering::Relaxed),
            dead_lettered = m.events_dead_lettered.load(Ordering::Relaxed),
            dropped = m.events_dropped.load(Ordering::Relaxed),
            "output stage shut down"
        );
    }
}

#[cfg(test)]
#[path = "output_stage_test.rs"]
mod tests;
