//! Client builder and frame delivery.
//!
//! The [`ClientBuilder`] provides a fluent API for configuring callbacks and
//! timings. The [`Client`] wires a [`ConnectionManager`] to a [`FrameBuffer`]:
//! 1. Resolve candidate sockets (explicit path or environment)
//! 2. Start the connection manager
//! 3. Reassemble raw chunks into frames
//! 4. Hand each complete frame to the frame callback
//!
//! # Example
//!
//! ```ignore
//! use pwnative::Client;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut client = Client::builder()
//!         .on_connected(|| tracing::info!("connected"))
//!         .on_frame(|frame| tracing::info!(id = frame.id(), opcode = frame.opcode(), "frame"))
//!         .start();
//!
//!     tokio::signal::ctrl_c().await.unwrap();
//!     client.close().await;
//! }
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::Span;

use crate::connection::{
    ConnectedCallback, ConnectionConfig, ConnectionManager, ConnectionState, ErrorCallback,
    DEFAULT_BACKOFF, DEFAULT_CONNECT_TIMEOUT,
};
use crate::error::PwError;
use crate::protocol::{Frame, FrameBuffer, MAX_PAYLOAD_SIZE};
use crate::transport::resolve_candidates;

/// Invoked on the connection worker with each complete frame.
pub type FrameCallback = Arc<dyn Fn(Frame) + Send + Sync>;

/// Builder for configuring and starting a [`Client`].
pub struct ClientBuilder {
    socket_path: Option<PathBuf>,
    connect_timeout: Duration,
    backoff: Duration,
    max_payload_size: u32,
    span: Option<Span>,
    on_connected: Option<ConnectedCallback>,
    on_error: Option<ErrorCallback>,
    on_frame: Option<FrameCallback>,
}

impl ClientBuilder {
    /// Create a new client builder.
    pub fn new() -> Self {
        Self {
            socket_path: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            backoff: DEFAULT_BACKOFF,
            max_payload_size: MAX_PAYLOAD_SIZE,
            span: None,
            on_connected: None,
            on_error: None,
            on_frame: None,
        }
    }

    /// Connect to this socket only instead of the environment defaults.
    pub fn socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = Some(path.into());
        self
    }

    /// Set the per-candidate connect timeout.
    ///
    /// Default: 30 seconds
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the wait between failed connection cycles.
    ///
    /// Default: 30 seconds
    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Reject frames announcing a larger payload.
    ///
    /// Default: [`MAX_PAYLOAD_SIZE`]
    pub fn max_payload_size(mut self, size: u32) -> Self {
        self.max_payload_size = size;
        self
    }

    /// Span the connection worker logs into.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Called after every successful (re)connect.
    pub fn on_connected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_connected = Some(Arc::new(f));
        self
    }

    /// Called on connection failures and on frames that cannot be reassembled.
    ///
    /// A frame that cannot be reassembled also drops the connection, so the
    /// client reconnects after the backoff.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&PwError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Called with every complete frame, in arrival order.
    pub fn on_frame<F>(mut self, f: F) -> Self
    where
        F: Fn(Frame) + Send + Sync + 'static,
    {
        self.on_frame = Some(Arc::new(f));
        self
    }

    /// Start the client.
    ///
    /// Returns immediately; connecting happens in the background. Must be
    /// called from within a Tokio runtime.
    pub fn start(self) -> Client {
        let candidates = resolve_candidates(self.socket_path.as_deref());
        if candidates.is_empty() {
            tracing::warn!("no socket path configured and none found in the environment");
        }

        let frames = Arc::new(Mutex::new(FrameBuffer::with_max_payload(
            self.max_payload_size,
        )));

        let mut builder = ConnectionConfig::builder()
            .candidates(candidates)
            .connect_timeout(self.connect_timeout)
            .backoff(self.backoff);
        if let Some(span) = self.span {
            builder = builder.span(span);
        }

        let on_connected = self.on_connected;
        let buffer = frames.clone();
        builder = builder.on_connected(move || {
            // Leftovers from the previous connection belong to no frame.
            lock(&buffer).clear();
            if let Some(on_connected) = &on_connected {
                on_connected();
            }
        });

        if let Some(on_error) = self.on_error {
            builder = builder.on_error(move |e| on_error(e));
        }

        let on_frame = self.on_frame;
        builder = builder.try_on_data(move |chunk| {
            let complete = {
                let mut buffer = lock(&frames);
                buffer.push(chunk).map_err(|e| {
                    // The stream is out of sync; only a fresh connection recovers it.
                    buffer.clear();
                    tracing::warn!(error = %e, "dropping connection after undecodable stream data");
                    e
                })?
            };
            if let Some(on_frame) = &on_frame {
                for frame in complete {
                    on_frame(frame);
                }
            }
            Ok(())
        });

        Client {
            manager: builder.spawn(),
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn lock(buffer: &Mutex<FrameBuffer>) -> MutexGuard<'_, FrameBuffer> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A running client delivering frames from the server.
pub struct Client {
    manager: ConnectionManager,
}

impl Client {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }

    /// Receiver notified on every connection state change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.manager.subscribe()
    }

    /// Shut down the connection and wait until no callback can run anymore.
    pub async fn close(&mut self) {
        self.manager.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = ClientBuilder::default();

        assert!(builder.socket_path.is_none());
        assert_eq!(builder.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(builder.backoff, DEFAULT_BACKOFF);
        assert_eq!(builder.max_payload_size, MAX_PAYLOAD_SIZE);
    }

    #[test]
    fn test_builder_configuration() {
        let builder = Client::builder()
            .socket_path("/tmp/pw.sock")
            .connect_timeout(Duration::from_secs(1))
            .backoff(Duration::from_millis(500))
            .max_payload_size(4096)
            .on_connected(|| {})
            .on_error(|_| {})
            .on_frame(|_| {});

        assert_eq!(builder.socket_path, Some(PathBuf::from("/tmp/pw.sock")));
        assert_eq!(builder.connect_timeout, Duration::from_secs(1));
        assert_eq!(builder.backoff, Duration::from_millis(500));
        assert_eq!(builder.max_payload_size, 4096);
        assert!(builder.on_connected.is_some());
        assert!(builder.on_error.is_some());
        assert!(builder.on_frame.is_some());
    }

    #[tokio::test]
    async fn test_start_and_close_without_server() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = Client::builder()
            .socket_path(dir.path().join("absent.sock"))
            .backoff(Duration::from_secs(3600))
            .start();

        client.close().await;
        assert_eq!(client.state(), ConnectionState::Closed);
    }
}
