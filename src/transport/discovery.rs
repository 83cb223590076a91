//! Default socket path discovery.
//!
//! When no explicit path is configured, the server socket is looked up in
//! each runtime directory named by [`SOCKET_DIR_ENV_VARS`], in order.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variables naming directories that may hold the server socket.
pub const SOCKET_DIR_ENV_VARS: [&str; 3] =
    ["PIPEWIRE_RUNTIME_DIR", "XDG_RUNTIME_DIR", "USERPROFILE"];

/// File name of the default server socket.
pub const DEFAULT_SOCKET_NAME: &str = "pipewire-0";

/// Candidate socket paths built from the process environment.
pub fn default_socket_paths() -> Vec<PathBuf> {
    socket_paths_from(|var| std::env::var_os(var))
}

/// Candidate socket paths built from an arbitrary variable lookup.
///
/// Unset and empty variables are skipped.
pub fn socket_paths_from<F>(lookup: F) -> Vec<PathBuf>
where
    F: Fn(&str) -> Option<OsString>,
{
    SOCKET_DIR_ENV_VARS
        .iter()
        .filter_map(|var| lookup(var))
        .filter(|dir| !dir.is_empty())
        .map(|dir| PathBuf::from(dir).join(DEFAULT_SOCKET_NAME))
        .collect()
}

/// Use `explicit` when given, otherwise the environment defaults.
pub fn resolve_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    match explicit {
        Some(path) => vec![path.to_path_buf()],
        None => default_socket_paths(),
    }
}
