//! Stdin input - read lines from standard input

use async_trait::async_trait;
use hauler_event::Event;
use hauler_topology::{DriverOptions, Input, Result, parse_driver_options};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Buffered events between the reader task and the workers.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StdinConfig {}

/// Reads standard input line by line until EOF.
///
/// EOF ends the stream: `read_one` returns `None` and the owning box shuts
/// down (the classic pipe-to-hauler use).
pub struct StdinInput {
    receiver: Mutex<mpsc::Receiver<Event>>,
    cancel: CancellationToken,
}

impl StdinInput {
    /// Build from plan options (the driver takes none) and start reading.
    pub fn from_options(options: &DriverOptions) -> Result<Self> {
        let _: StdinConfig = parse_driver_options("input", "stdin", options)?;
        Ok(Self::from_reader(tokio::io::stdin()))
    }

    /// Drive the input from any line source (tests feed cursors).
    pub(crate) fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            loop {
                let line = tokio::select! {
                    line = lines.next_line() => line,
                    _ = task_cancel.cancelled() => break,
                };
                match line {
                    Ok(Some(line)) => {
                        if line.is_empty() {
                            continue;
                        }
                        let event = crate::codec::decode_line(&line);
                        // A full channel applies backpressure to the reader.
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("stdin reached EOF");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "stdin read error, ending stream");
                        break;
                    }
                }
            }
            // Dropping the sender makes read_one return None.
        });

        Self {
            receiver: Mutex::new(rx),
            cancel,
        }
    }
}

#[async_trait]
impl Input for StdinInput {
    async fn read_one(&self) -> Option<Event> {
        self.receiver.lock().await.recv().await
    }

    async fn shutdown(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[path = "stdin_test.rs"]
mod tests;
