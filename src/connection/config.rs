//! Connection configuration and builder.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::Span;

use super::manager::ConnectionManager;
use crate::error::{PwError, Result};

/// Default timeout for a single candidate connect attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default wait between a failed connection cycle and the next one.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(30);

/// Invoked on the worker after each successful connect.
pub type ConnectedCallback = Arc<dyn Fn() + Send + Sync>;

/// Invoked on the worker when a connect cycle or an established connection fails.
pub type ErrorCallback = Arc<dyn Fn(&PwError) + Send + Sync>;

/// Invoked on the worker with each chunk read from the socket.
///
/// An error drops the current connection and is handled like a read failure.
pub type DataCallback = Arc<dyn Fn(&[u8]) -> Result<()> + Send + Sync>;

/// Immutable configuration for a [`ConnectionManager`].
///
/// Build one with [`ConnectionConfig::builder`].
#[derive(Clone)]
pub struct ConnectionConfig {
    pub(crate) candidates: Vec<PathBuf>,
    pub(crate) connect_timeout: Duration,
    pub(crate) backoff: Duration,
    pub(crate) on_connected: Option<ConnectedCallback>,
    pub(crate) on_error: Option<ErrorCallback>,
    pub(crate) on_data: Option<DataCallback>,
    pub(crate) span: Option<Span>,
}

impl ConnectionConfig {
    /// Create a new connection builder.
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    /// Candidate socket paths, in failover priority order.
    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Timeout applied to each candidate connect attempt.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Wait between failed connection cycles.
    pub fn backoff(&self) -> Duration {
        self.backoff
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("candidates", &self.candidates)
            .field("connect_timeout", &self.connect_timeout)
            .field("backoff", &self.backoff)
            .field("on_connected", &self.on_connected.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_data", &self.on_data.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ConnectionConfig`].
///
/// All callbacks run on the connection worker task, never on the task that
/// built or closes the manager. Anything they touch must be synchronized by
/// the caller.
pub struct ConnectionBuilder {
    config: ConnectionConfig,
}

impl ConnectionBuilder {
    /// Create a builder with no candidates and default timings.
    pub fn new() -> Self {
        Self {
            config: ConnectionConfig {
                candidates: Vec::new(),
                connect_timeout: DEFAULT_CONNECT_TIMEOUT,
                backoff: DEFAULT_BACKOFF,
                on_connected: None,
                on_error: None,
                on_data: None,
                span: None,
            },
        }
    }

    /// Append a candidate socket path. Earlier candidates are tried first.
    pub fn candidate(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.candidates.push(path.into());
        self
    }

    /// Append several candidate socket paths, keeping their order.
    pub fn candidates<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.config
            .candidates
            .extend(paths.into_iter().map(Into::into));
        self
    }

    /// Set the per-candidate connect timeout.
    ///
    /// Default: 30 seconds
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the wait between failed connection cycles.
    ///
    /// Default: 30 seconds
    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.config.backoff = backoff;
        self
    }

    /// Called after every successful (re)connect.
    pub fn on_connected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.config.on_connected = Some(Arc::new(f));
        self
    }

    /// Called when a connect cycle fails or an established connection drops.
    ///
    /// Never called for shutdown.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&PwError) + Send + Sync + 'static,
    {
        self.config.on_error = Some(Arc::new(f));
        self
    }

    /// Called with every chunk read from the socket (at most 1024 bytes).
    ///
    /// Chunks are not aligned to message boundaries.
    pub fn on_data<F>(mut self, f: F) -> Self
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        self.config.on_data = Some(Arc::new(move |chunk: &[u8]| -> Result<()> {
            f(chunk);
            Ok(())
        }));
        self
    }

    /// Like [`on_data`](Self::on_data), but the callback can reject the stream.
    ///
    /// Returning an error closes the socket, reports the error through
    /// `on_error` and backs off before reconnecting.
    pub fn try_on_data<F>(mut self, f: F) -> Self
    where
        F: Fn(&[u8]) -> Result<()> + Send + Sync + 'static,
    {
        self.config.on_data = Some(Arc::new(f));
        self
    }

    /// Span the worker's log events are recorded in.
    ///
    /// Default: `debug_span!("pw_connection")`
    pub fn span(mut self, span: Span) -> Self {
        self.config.span = Some(span);
        self
    }

    /// Finish building the configuration.
    pub fn build(self) -> ConnectionConfig {
        self.config
    }

    /// Build the configuration and start a manager for it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(self) -> ConnectionManager {
        ConnectionManager::spawn(self.build())
    }
}

impl Default for ConnectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
