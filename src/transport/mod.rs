//! Transport module - Unix domain socket connection handling.
//!
//! - Dialing an ordered list of candidate sockets with failover
//! - Default socket path discovery from the environment

mod discovery;
mod socket;

pub use discovery::{
    default_socket_paths, resolve_candidates, socket_paths_from, DEFAULT_SOCKET_NAME,
    SOCKET_DIR_ENV_VARS,
};
pub use socket::{connect, Connection};
