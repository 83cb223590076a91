//! Error types for pwnative.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for all pwnative operations.
#[derive(Debug, Error)]
pub enum PwError {
    /// Every candidate socket refused or timed out during one connect cycle.
    #[error("unable to connect to a socket ({})", AttemptSummary(.attempts))]
    AllCandidatesFailed {
        /// One entry per candidate tried, in order.
        attempts: Vec<EndpointUnreachable>,
    },

    /// Read error on an established connection.
    #[error("connection lost: {0}")]
    ConnectionLost(#[source] std::io::Error),

    /// The server closed the connection.
    #[error("connection closed")]
    ConnectionClosed,

    /// Shutdown was requested. Never handed to an error callback.
    #[error("cancelled")]
    Cancelled,

    /// Header payload size does not fit in 24 bits.
    #[error("header size {size} exceeds the 24-bit maximum")]
    SizeOutOfRange { size: u32 },

    /// Incoming frame announces a payload above the configured limit.
    #[error("payload size {size} exceeds maximum {max}")]
    FrameTooLarge { size: u32, max: u32 },

    /// Header size field disagrees with the payload handed alongside it.
    #[error("header announces {declared} payload bytes but {actual} were given")]
    PayloadLengthMismatch { declared: u32, actual: usize },
}

impl PwError {
    /// Whether this error is the shutdown signal rather than a failure.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PwError::Cancelled)
    }
}

/// A single candidate socket that could not be reached.
#[derive(Debug, Error)]
#[error("{}: {source}", .path.display())]
pub struct EndpointUnreachable {
    /// Socket path that was dialed.
    pub path: PathBuf,
    /// Why the dial failed (timeouts use `ErrorKind::TimedOut`).
    #[source]
    pub source: std::io::Error,
}

struct AttemptSummary<'a>(&'a [EndpointUnreachable]);

impl fmt::Display for AttemptSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            [] => f.write_str("no candidate paths"),
            [only] => write!(f, "1 candidate tried: {only}"),
            attempts => {
                write!(f, "{} candidates tried", attempts.len())?;
                for attempt in attempts {
                    write!(f, "; {attempt}")?;
                }
                Ok(())
            }
        }
    }
}

/// Result type alias using PwError.
pub type Result<T> = std::result::Result<T, PwError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn unreachable(path: &str) -> EndpointUnreachable {
        EndpointUnreachable {
            path: PathBuf::from(path),
            source: io::Error::from(io::ErrorKind::NotFound),
        }
    }

    #[test]
    fn test_all_candidates_failed_lists_attempts() {
        let err = PwError::AllCandidatesFailed {
            attempts: vec![unreachable("/run/a"), unreachable("/run/b")],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 candidates tried"));
        assert!(msg.contains("/run/a"));
        assert!(msg.contains("/run/b"));
    }

    #[test]
    fn test_all_candidates_failed_empty() {
        let err = PwError::AllCandidatesFailed { attempts: vec![] };
        assert!(err.to_string().contains("no candidate paths"));
    }

    #[test]
    fn test_messages_are_lowercase() {
        let errors = [
            PwError::AllCandidatesFailed { attempts: vec![] },
            PwError::ConnectionLost(io::Error::from(io::ErrorKind::BrokenPipe)),
            PwError::ConnectionClosed,
            PwError::Cancelled,
            PwError::SizeOutOfRange { size: 1 << 24 },
            PwError::FrameTooLarge { size: 100, max: 64 },
            PwError::PayloadLengthMismatch {
                declared: 4,
                actual: 2,
            },
        ];
        for err in errors {
            let msg = err.to_string();
            assert!(msg.starts_with(char::is_lowercase), "{msg}");
        }
    }

    #[test]
    fn test_is_cancelled() {
        assert!(PwError::Cancelled.is_cancelled());
        assert!(!PwError::ConnectionClosed.is_cancelled());
    }
}
