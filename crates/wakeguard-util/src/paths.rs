//! Default runtime paths for wakeguard
//!
//! Everything lives in a per-user runtime directory, nothing is persisted:
//! - Lock: `$XDG_RUNTIME_DIR/wakeguard/<instance>.lock` or `/tmp/wakeguard-$USER/<instance>.lock`
//! - Socket: the same directory, `<instance>.sock`

use std::path::PathBuf;

use crate::InstanceName;

/// Application subdirectory name
const APP_DIR: &str = "wakeguard";

/// Get the runtime directory holding lock files and activation sockets.
///
/// Order of precedence:
/// 1. `$XDG_RUNTIME_DIR/wakeguard` (if XDG_RUNTIME_DIR is set)
/// 2. `/tmp/wakeguard-$USER` (fallback)
pub fn runtime_dir() -> PathBuf {
    // Try XDG_RUNTIME_DIR first (typically /run/user/<uid>)
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR")
        && !runtime_dir.is_empty()
    {
        return PathBuf::from(runtime_dir).join(APP_DIR);
    }

    // Fallback to /tmp with username
    let username = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/{}-{}", APP_DIR, username))
}

/// Path of the lock file backing the named instance lock
pub fn lock_path(name: &InstanceName) -> PathBuf {
    runtime_dir().join(format!("{}.lock", name.as_str()))
}

/// Path of the activation socket the named primary instance listens on
pub fn socket_path(name: &InstanceName) -> PathBuf {
    runtime_dir().join(format!("{}.sock", name.as_str()))
}
