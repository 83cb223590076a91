//! Monitor - log every frame the server sends.
//!
//! This example demonstrates:
//! - Starting a client against the default (or an explicit) socket
//! - Receiving reassembled frames on the connection worker
//! - Closing the client cleanly on Ctrl-C
//!
//! # Running
//!
//! ```text
//! RUST_LOG=info cargo run --example monitor
//! RUST_LOG=debug cargo run --example monitor -- /run/user/1000/pipewire-0
//! ```

use std::time::Duration;

use pwnative::Client;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut builder = Client::builder()
        .backoff(Duration::from_secs(5))
        .on_connected(|| tracing::info!("connected to server"))
        .on_error(|e| tracing::warn!(error = %e, "connection problem"))
        .on_frame(|frame| {
            tracing::info!(
                id = frame.id(),
                opcode = frame.opcode(),
                seq = frame.seq(),
                size = frame.payload_len(),
                fds = frame.num_fds(),
                "frame"
            );
        });

    if let Some(path) = std::env::args_os().nth(1) {
        builder = builder.socket_path(path);
    }

    let mut client = builder.start();

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "unable to listen for Ctrl-C");
    }

    client.close().await;
    tracing::info!("closed");
}
