//! File output - append JSON lines to a file

use std::path::PathBuf;

use async_trait::async_trait;
use hauler_event::Event;
use hauler_topology::{DriverOptions, Output, Result, parse_driver_options};
use serde::Deserialize;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Options for the `file` output driver.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileOutputConfig {
    pub path: PathBuf,
}

/// Appends one JSON line per event, creating parent directories on first
/// write. The handle is dropped on a failed write so the next attempt
/// reopens cleanly (the retry layer above drives those attempts).
pub struct FileOutput {
    config: FileOutputConfig,
    file: Option<File>,
}

impl FileOutput {
    /// Build from plan options.
    pub fn from_options(options: &DriverOptions) -> Result<Self> {
        let config: FileOutputConfig = parse_driver_options("output", "file", options)?;
        Ok(Self::new(config))
    }

    /// Create the output; the file opens lazily on first emit.
    pub fn new(config: FileOutputConfig) -> Self {
        Self { config, file: None }
    }

    async fn open(&mut self) -> std::io::Result<&mut File> {
        if self.file.is_none() {
            if let Some(parent) = self.config.path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.config.path)
                .await?;
            debug!(path = %self.config.path.display(), "file output opened");
            self.file = Some(file);
        }
        Ok(self.file.as_mut().expect("opened above"))
    }

    async fn write_batch(&mut self, events: &[Event]) -> std::io::Result<()> {
        let mut buf = String::new();
        for event in events {
            buf.push_str(&event.to_json_line());
            buf.push('\n');
        }

        let file = self.open().await?;
        file.write_all(buf.as_bytes()).await?;
        file.flush().await
    }
}

#[async_trait]
impl Output for FileOutput {
    async fn emit(&mut self, events: &[Event]) -> bool {
        match self.write_batch(events).await {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %self.config.path.display(), error = %e, "file write failed");
                // Reopen on the next attempt.
                self.file = None;
                false
            }
        }
    }

    async fn shutdown(&mut self) {
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.flush().await {
                warn!(path = %self.config.path.display(), error = %e, "file flush on shutdown failed");
            }
            self.file = None;
        }
    }
}

#[cfg(test)]
#[path = "file_test.rs"]
mod tests;
