//! Connection module - resilient connection lifecycle.
//!
//! [`ConnectionManager`] keeps one connection to the server alive: it dials
//! the candidate sockets in order, delivers raw chunks to a callback, and on
//! failure waits out a backoff before trying again from the first candidate.
//!
//! # Example
//!
//! ```ignore
//! use pwnative::connection::ConnectionConfig;
//!
//! let mut manager = ConnectionConfig::builder()
//!     .candidate("/run/user/1000/pipewire-0")
//!     .on_connected(|| tracing::info!("connected"))
//!     .on_data(|chunk| tracing::debug!(len = chunk.len(), "chunk"))
//!     .spawn();
//!
//! // ...
//! manager.close().await;
//! ```

mod config;
mod manager;

pub use config::{
    ConnectedCallback, ConnectionBuilder, ConnectionConfig, DataCallback, ErrorCallback,
    DEFAULT_BACKOFF, DEFAULT_CONNECT_TIMEOUT,
};
pub use manager::{ConnectionManager, ConnectionState, READ_CHUNK_SIZE};
