//! # pwnative
//!
//! Client-side transport for the PipeWire native protocol.
//!
//! The server is reached over a Unix domain socket that may live at one of
//! several paths. This crate keeps a connection to it alive and decodes the
//! 16-byte header that prefixes every message.
//!
//! ## Architecture
//!
//! - **Protocol**: header codec in host byte order, frame reassembly
//! - **Transport**: candidate socket dialing with failover, default path discovery
//! - **Connection**: background worker with reconnect, backoff and prompt shutdown
//! - **Client**: connection + reassembly, delivering whole frames
//!
//! ## Example
//!
//! ```ignore
//! use pwnative::Client;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut client = Client::builder()
//!         .on_frame(|frame| println!("id={} opcode={}", frame.id(), frame.opcode()))
//!         .on_error(|e| eprintln!("{e}"))
//!         .start();
//!
//!     tokio::signal::ctrl_c().await.unwrap();
//!     client.close().await;
//! }
//! ```

pub mod connection;
pub mod error;
pub mod protocol;
pub mod transport;

mod client;

pub use client::{Client, ClientBuilder, FrameCallback};
pub use connection::{ConnectionConfig, ConnectionManager, ConnectionState};
pub use error::PwError;
