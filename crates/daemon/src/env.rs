// SPDX-License-Identifier: MIT

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("cannot resolve a state directory: HOME is not set and FLOTILLA_STATE_DIR/XDG_STATE_HOME are unset")]
    NoStateDir,
}

/// Resolve the state directory: `FLOTILLA_STATE_DIR` > `XDG_STATE_HOME/flotilla` > `~/.local/state/flotilla`.
pub fn state_dir() -> Result<PathBuf, EnvError> {
    if let Ok(dir) = std::env::var("FLOTILLA_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("flotilla"));
    }
    let home = std::env::var("HOME").map_err(|_| EnvError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/flotilla"))
}

/// How long a CLI client waits for the supervisor to answer a control request.
pub fn ipc_timeout() -> Duration {
    std::env::var("FLOTILLA_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}
