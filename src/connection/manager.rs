//! Connection manager and its worker task.
//!
//! A [`ConnectionManager`] owns one logical connection to the server. It
//! spawns a single worker task that cycles through:
//!
//! ```text
//! Connecting ──ok──► Connected ──read error / EOF──┐
//!     │                                            │
//!     └──all candidates failed──► Backoff ◄────────┘
//!                                    │
//!                                    └──backoff elapsed──► Connecting
//!
//! any state ──close()──► Closed
//! ```
//!
//! Every suspension point of the worker (dialing, reading, backoff) is raced
//! against a `CancellationToken`, so [`ConnectionManager::close`] unblocks it
//! promptly and then waits for the task to finish. A data callback that
//! returns an error ends the session the same way a read error does.

use std::fmt;

use tokio::io::AsyncReadExt;
use tokio::net::UnixStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::config::ConnectionConfig;
use crate::error::PwError;
use crate::transport;

/// Maximum number of bytes handed to the data callback at once.
pub const READ_CHUNK_SIZE: usize = 1024;

/// Lifecycle state of a managed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Dialing the candidate sockets.
    Connecting,
    /// Connected and reading.
    Connected,
    /// Waiting before the next connection cycle.
    Backoff,
    /// Worker has exited. Terminal.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Backoff => "backoff",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Keeps a connection to the server alive until closed.
///
/// Reconnects on failure, fails over across candidate sockets and backs off
/// between cycles. Callbacks from the [`ConnectionConfig`] run on the
/// manager's worker task.
///
/// Dropping a manager without calling [`close`](Self::close) requests
/// shutdown but does not wait for the worker.
pub struct ConnectionManager {
    cancel: CancellationToken,
    state: watch::Receiver<ConnectionState>,
    worker: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    /// Start managing a connection with the given configuration.
    ///
    /// The worker starts connecting immediately. Must be called from within a
    /// Tokio runtime.
    pub fn spawn(config: ConnectionConfig) -> Self {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let span = config
            .span
            .clone()
            .unwrap_or_else(|| tracing::debug_span!("pw_connection"));

        let worker = Worker {
            config,
            cancel: cancel.clone(),
            state: state_tx,
        };
        let handle = tokio::spawn(worker.run().instrument(span));

        Self {
            cancel,
            state: state_rx,
            worker: Some(handle),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Whether [`close`](Self::close) has completed.
    pub fn is_closed(&self) -> bool {
        self.worker.is_none()
    }

    /// Shut the connection down and wait for the worker to exit.
    ///
    /// Once this returns no callback will run again and the socket is closed.
    /// Calling it again returns immediately.
    pub async fn close(&mut self) {
        self.cancel.cancel();
        let Some(worker) = self.worker.take() else {
            return;
        };
        if let Err(e) = worker.await {
            tracing::error!(error = %e, "connection worker did not exit cleanly");
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state())
            .field("closed", &self.is_closed())
            .finish()
    }
}

struct Worker {
    config: ConnectionConfig,
    cancel: CancellationToken,
    state: watch::Sender<ConnectionState>,
}

impl Worker {
    async fn run(self) {
        let mut cycle: u64 = 0;

        loop {
            cycle += 1;
            let err = self.session(cycle).await;
            if err.is_cancelled() || self.cancel.is_cancelled() {
                break;
            }

            tracing::warn!(cycle, error = %err, "connection cycle failed");
            if let Some(on_error) = &self.config.on_error {
                on_error(&err);
            }

            self.set_state(ConnectionState::Backoff);
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.backoff) => {}
            }
        }

        tracing::debug!("connection worker exited");
    }

    /// One connect + read cycle. Always ends with the reason it stopped.
    async fn session(&self, cycle: u64) -> PwError {
        self.set_state(ConnectionState::Connecting);
        tracing::debug!(cycle, candidates = self.config.candidates.len(), "connecting");

        let conn = match transport::connect(
            &self.config.candidates,
            self.config.connect_timeout,
            &self.cancel,
        )
        .await
        {
            Ok(conn) => conn,
            Err(e) => return e,
        };
        if self.cancel.is_cancelled() {
            return PwError::Cancelled;
        }

        tracing::info!(path = %conn.path().display(), "connected");
        self.set_state(ConnectionState::Connected);
        if let Some(on_connected) = &self.config.on_connected {
            on_connected();
        }

        self.read_loop(conn.into_stream()).await
    }

    async fn read_loop(&self, mut stream: UnixStream) -> PwError {
        let mut buf = [0u8; READ_CHUNK_SIZE];

        loop {
            let read = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return PwError::Cancelled,
                read = stream.read(&mut buf) => read,
            };

            let n = match read {
                Ok(0) => return PwError::ConnectionClosed,
                Ok(n) => n,
                Err(e) => return PwError::ConnectionLost(e),
            };

            // Shutdown may have raced with the read; drop the chunk.
            if self.cancel.is_cancelled() {
                return PwError::Cancelled;
            }
            if let Some(on_data) = &self.config.on_data {
                if let Err(e) = on_data(&buf[..n]) {
                    return e;
                }
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::debug!(from = %previous, to = %state, "state changed");
        }
    }
}

impl Drop for Worker {
    // Also runs when a callback panics and the task unwinds.
    fn drop(&mut self) {
        self.set_state(ConnectionState::Closed);
    }
}
