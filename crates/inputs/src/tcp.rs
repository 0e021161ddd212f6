//! TCP input - line-oriented listener
//!
//! Accepts any number of connections and feeds decoded lines into one
//! stream shared by the box's workers. The listener socket is bound at
//! construction so a bad address fails plan construction, not the first
//! read.

use std::net::SocketAddr;

use async_trait::async_trait;
use hauler_event::Event;
use hauler_topology::{DriverOptions, Input, Result, TopologyError, parse_driver_options};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Buffered events between connection tasks and the workers.
const CHANNEL_CAPACITY: usize = 1024;

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_max_line_bytes() -> usize {
    1024 * 1024
}

/// Options for the `tcp` input driver.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TcpInputConfig {
    #[serde(default = "default_address")]
    pub address: String,
    pub port: u16,
    /// Lines longer than this are dropped with a warning.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

/// Line-oriented TCP listener input.
pub struct TcpInput {
    receiver: Mutex<mpsc::Receiver<Event>>,
    cancel: CancellationToken,
    local_addr: SocketAddr,
    /// Awaited on shutdown so the listener socket is closed (and the port
    /// free again) by the time shutdown returns. Reload rebinds it.
    accept_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl TcpInput {
    /// Build from plan options and start accepting.
    pub fn from_options(options: &DriverOptions) -> Result<Self> {
        let config: TcpInputConfig = parse_driver_options("input", "tcp", options)?;
        Self::bind(config)
    }

    /// Bind the listener and spawn the accept loop.
    pub fn bind(config: TcpInputConfig) -> Result<Self> {
        let addr = format!("{}:{}", config.address, config.port);
        // Bind synchronously so construction reports the error; the
        // listener moves onto the runtime right after.
        let std_listener = std::net::TcpListener::bind(&addr)
            .map_err(|e| TopologyError::options("input", "tcp", format!("bind {addr}: {e}")))?;
        std_listener
            .set_nonblocking(true)
            .map_err(|e| TopologyError::options("input", "tcp", e.to_string()))?;
        let local_addr = std_listener
            .local_addr()
            .map_err(|e| TopologyError::options("input", "tcp", e.to_string()))?;
        let listener = TcpListener::from_std(std_listener)
            .map_err(|e| TopologyError::options("input", "tcp", e.to_string()))?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let accept_cancel = cancel.clone();
        let max_line_bytes = config.max_line_bytes;
        let accept_task = tokio::spawn(async move {
            info!(addr = %local_addr, "tcp input listening");
            loop {
                let accepted = tokio::select! {
                    accepted = listener.accept() => accepted,
                    _ = accept_cancel.cancelled() => break,
                };
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "tcp accept failed");
                        continue;
                    }
                };
                debug!(peer = %peer, "tcp connection opened");

                let tx = tx.clone();
                let conn_cancel = accept_cancel.clone();
                tokio::spawn(async move {
                    let mut lines = BufReader::new(stream).lines();
                    loop {
                        let line = tokio::select! {
                            line = lines.next_line() => line,
                            _ = conn_cancel.cancelled() => break,
                        };
                        match line {
                            Ok(Some(line)) => {
                                if line.is_empty() {
                                    continue;
                                }
                                if line.len() > max_line_bytes {
                                    warn!(
                                        peer = %peer,
                                        bytes = line.len(),
                                        limit = max_line_bytes,
                                        "oversized line dropped"
                                    );
                                    continue;
                                }
                                let event = crate::codec::decode_line(&line);
                                if tx.send(event).await.is_err() {
                                    break;
                                }
                            }
                            Ok(None) => break,
                            Err(e) => {
                                debug!(peer = %peer, error = %e, "tcp read error");
                                break;
                            }
                        }
                    }
                    debug!(peer = %peer, "tcp connection closed");
                });
            }
            // The accept task's sender drops here; connection tasks hold
            // their own clones and end on cancellation or disconnect.
        });

        Ok(Self {
            receiver: Mutex::new(rx),
            cancel,
            local_addr,
            accept_task: Mutex::new(Some(accept_task)),
        })
    }

    /// The bound address (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[async_trait]
impl Input for TcpInput {
    async fn read_one(&self) -> Option<Event> {
        self.receiver.lock().await.recv().await
    }

    async fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(task) = self.accept_task.lock().await.take()
            && task.await.is_err()
        {
            warn!("tcp accept task panicked during shutdown");
        }
    }
}

#[cfg(test)]
#[path = "tcp_test.rs"]
mod tests;
