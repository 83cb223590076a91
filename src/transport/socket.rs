//! Unix domain socket dialing with failover.
//!
//! [`connect`] walks an ordered list of candidate socket paths and returns the
//! first one that accepts. Every failed candidate is recorded; when all of
//! them fail the caller gets a single aggregate error.
//!
//! # Example
//!
//! ```ignore
//! use pwnative::transport::connect;
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let conn = connect(&candidates, Duration::from_secs(5), &cancel).await?;
//! println!("connected to {}", conn.path().display());
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::net::UnixStream;
use tokio_util::sync::CancellationToken;

use crate::error::{EndpointUnreachable, PwError, Result};

/// A live connection and the candidate path that accepted it.
#[derive(Debug)]
pub struct Connection {
    stream: UnixStream,
    path: PathBuf,
}

impl Connection {
    /// Path of the socket this connection was made to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a reference to the underlying stream.
    pub fn inner(&self) -> &UnixStream {
        &self.stream
    }

    /// Get a mutable reference to the underlying stream.
    pub fn inner_mut(&mut self) -> &mut UnixStream {
        &mut self.stream
    }

    /// Consume the connection, returning the stream.
    pub fn into_stream(self) -> UnixStream {
        self.stream
    }
}

/// Connect to the first reachable candidate, in list order.
///
/// Each attempt is bounded by `timeout`. Cancelling `cancel` aborts the walk
/// with [`PwError::Cancelled`].
///
/// # Errors
///
/// - [`PwError::Cancelled`] if `cancel` fired before a connection was made
/// - [`PwError::AllCandidatesFailed`] if no candidate accepted
pub async fn connect(
    candidates: &[PathBuf],
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Connection> {
    let mut attempts = Vec::with_capacity(candidates.len());

    for path in candidates {
        let dial = tokio::time::timeout(timeout, UnixStream::connect(path));
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PwError::Cancelled),
            outcome = dial => outcome,
        };

        let source = match outcome {
            Ok(Ok(stream)) => {
                return Ok(Connection {
                    stream,
                    path: path.clone(),
                })
            }
            Ok(Err(e)) => e,
            Err(_) => io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no answer within {timeout:?}"),
            ),
        };

        tracing::debug!(path = %path.display(), error = %source, "candidate socket unreachable");
        attempts.push(EndpointUnreachable {
            path: path.clone(),
            source,
        });
    }

    Err(PwError::AllCandidatesFailed { attempts })
}
