//! Config file watcher - polling auto-reload trigger
//!
//! Polls the config path (file or directory) for modification-time and size
//! changes, debounces bursts (editors tend to write several times), and
//! fires a reload trigger. Watcher errors are never fatal: they are logged
//! and polling continues.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default poll period.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Quiet time required after a change before the trigger fires.
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Watches a config path and feeds the supervisor's reload mailbox.
pub struct ConfigWatcher {
    path: PathBuf,
    interval: Duration,
    debounce: Duration,
}

impl ConfigWatcher {
    /// Watch the given config file or directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            interval: POLL_INTERVAL,
            debounce: DEBOUNCE,
        }
    }

    /// Override the poll period (tests use short ones).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Override the debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Run until cancelled, sending `()` into `trigger` after each settled
    /// change. A full mailbox is fine: a reload is already pending.
    pub async fn run(self, trigger: mpsc::Sender<()>, cancel: CancellationToken) {
        info!(path = %self.path.display(), "config watcher started");

        let mut last = fingerprint(&self.path);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = cancel.cancelled() => {
                    debug!("config watcher stopped");
                    return;
                }
            }

            let current = fingerprint(&self.path);
            if current == last {
                continue;
            }

            // Debounce: wait for the writes to settle before triggering.
            let mut settled = current;
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(self.debounce) => {}
                    _ = cancel.cancelled() => return,
                }
                let next = fingerprint(&self.path);
                if next == settled {
                    break;
                }
                settled = next;
            }
            last = settled;

            info!(path = %self.path.display(), "config change detected, triggering reload");
            if trigger.try_send(()).is_err() {
                debug!("reload already pending, coalescing");
            }
        }
    }
}

/// Cheap change fingerprint: (path, mtime, len) of the file, or of every
/// YAML file in the directory.
fn fingerprint(path: &PathBuf) -> Vec<(PathBuf, Option<std::time::SystemTime>, u64)> {
    fn stat(path: &std::path::Path) -> (PathBuf, Option<std::time::SystemTime>, u64) {
        match fs::metadata(path) {
            Ok(meta) => (path.to_path_buf(), meta.modified().ok(), meta.len()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config watch stat failed");
                (path.to_path_buf(), None, 0)
            }
        }
    }

    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => {
            let mut entries: Vec<_> = match fs::read_dir(path) {
                Ok(dir) => dir
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|p| {
                        matches!(
                            p.extension().and_then(|e| e.to_str()),
                            Some("yml") | Some("yaml")
                        )
                    })
                    .map(|p| stat(&p))
                    .collect(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "config watch readdir failed");
                    Vec::new()
                }
            };
            entries.sort();
            entries
        }
        _ => vec![stat(path)],
    }
}

#[cfg(test)]
#[path = "watcher_test.rs"]
mod tests;
