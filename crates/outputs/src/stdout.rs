//! Stdout output - JSON lines on standard output

use async_trait::async_trait;
use hauler_event::Event;
use hauler_topology::{DriverOptions, Output, Result, parse_driver_options};
use serde::Deserialize;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter, Stdout};
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StdoutConfig {}

/// Writes one JSON line per event. Generic over the writer so tests can
/// capture output.
pub struct StdoutOutput<W: AsyncWrite + Unpin + Send = Stdout> {
    writer: BufWriter<W>,
}

impl StdoutOutput<Stdout> {
    /// Build from plan options (the driver takes none).
    pub fn from_options(options: &DriverOptions) -> Result<Self> {
        let _: StdoutConfig = parse_driver_options("output", "stdout", options)?;
        Ok(Self::with_writer(tokio::io::stdout()))
    }
}

impl<W: AsyncWrite + Unpin + Send> StdoutOutput<W> {
    /// Wrap an arbitrary writer.
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    async fn write_batch(&mut self, events: &[Event]) -> std::io::Result<()> {
        for event in events {
            self.writer.write_all(event.to_json_line().as_bytes()).await?;
            self.writer.write_all(b"\n").await?;
        }
        self.writer.flush().await
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Output for StdoutOutput<W> {
    async fn emit(&mut self, events: &[Event]) -> bool {
        match self.write_batch(events).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "stdout write failed");
                false
            }
        }
    }

    async fn shutdown(&mut self) {
        if let Err(e) = self.writer.flush().await {
            warn!(error = %e, "stdout flush on shutdown failed");
        }
    }
}

#[cfg(test)]
#[path = "stdout_test.rs"]
mod tests;
