// SPDX-License-Identifier: MIT

//! Reads a validated [`flotilla_core::Config`] from the process
//! environment (spec.md §6).

use flotilla_core::{BrokerConfig, Config, ConfigError, WorkerCommand};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{0} must not be empty")]
    EmptyWorkerCommand(&'static str),
    #[error("{0}={1:?} is not a valid value")]
    Invalid(&'static str, String),
    #[error(transparent)]
    Invariant(#[from] ConfigError),
}

/// Build a validated [`Config`] from `QUEUE_NAME`, `WORKER_COMMAND`, the
/// fleet-bound and policy env vars, and the broker connection vars — all
/// enumerated in spec.md §6. Unset numeric/duration vars fall back to
/// reasonable defaults; `QUEUE_NAME` and `WORKER_COMMAND` are required.
pub fn from_env() -> Result<Config, ConfigLoadError> {
    from_lookup(|name| std::env::var(name).ok())
}

/// Same as [`from_env`], but reads through an arbitrary lookup function
/// instead of the real process environment, so the parsing/validation
/// logic can be exercised without touching global process state.
pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigLoadError> {
    let required = |name: &'static str| lookup(name).ok_or(ConfigLoadError::Missing(name));
    let parse = |name: &'static str, default: &str| -> Result<String, ConfigLoadError> {
        Ok(lookup(name).unwrap_or_else(|| default.to_string()))
    };
    let parse_num = |name: &'static str, default: &str| -> Result<f64, ConfigLoadError> {
        let raw = parse(name, default)?;
        raw.parse().map_err(|_| ConfigLoadError::Invalid(name, raw))
    };

    let queue_name = required("QUEUE_NAME")?;
    let worker_command_line = required("WORKER_COMMAND")?;
    let mut parts = worker_command_line.split_whitespace();
    let program = parts.next().ok_or(ConfigLoadError::EmptyWorkerCommand("WORKER_COMMAND"))?;
    let worker_command =
        WorkerCommand { program: PathBuf::from(program), args: parts.map(str::to_string).collect() };

    let min_processes = parse_num("MIN_PROCESSES", "1")? as u32;
    let max_processes = parse_num("MAX_PROCESSES", "10")? as u32;
    let check_interval = Duration::from_secs_f64(parse_num("CHECK_INTERVAL", "5")?);
    let scale_up_multiplier = parse_num("SCALE_UP_THRESHOLD_MULTIPLIER", "5")?;
    let scale_down_multiplier = parse_num("SCALE_DOWN_THRESHOLD_MULTIPLIER", "2.5")?;
    let graceful_shutdown_timeout = Duration::from_secs_f64(parse_num("GRACEFUL_SHUTDOWN_TIMEOUT", "30")?);
    let process_startup_delay = Duration::from_secs_f64(parse_num("PROCESS_STARTUP_DELAY", "5")?);

    let broker = BrokerConfig {
        host: parse("BROKER_HOST", "127.0.0.1")?,
        port: parse_num("BROKER_PORT", "6379")? as u16,
        db: parse_num("BROKER_DB", "0")? as u32,
        password: lookup("BROKER_PASSWORD").filter(|s| !s.is_empty()),
    };

    Config::new(
        queue_name,
        worker_command,
        min_processes,
        max_processes,
        check_interval,
        scale_up_multiplier,
        scale_down_multiplier,
        graceful_shutdown_timeout,
        process_startup_delay,
        broker,
    )
    .map_err(Into::into)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
