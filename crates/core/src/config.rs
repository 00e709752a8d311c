// SPDX-License-Identifier: MIT

//! Validated, immutable supervisor configuration (spec.md §3).
//!
//! `Config` can only be constructed through [`Config::new`], which enforces
//! every invariant up front — once built, a `Config` is known-good for the
//! supervisor's entire lifetime. There is no reconfiguration path.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The worker program's command line, launched verbatim per worker with no
/// per-worker parameterization (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

/// Broker connection parameters (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub db: u32,
    pub password: Option<String>,
}

/// Validated supervisor configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub queue_name: String,
    pub worker_command: WorkerCommand,
    pub min_processes: u32,
    pub max_processes: u32,
    pub check_interval: Duration,
    pub scale_up_multiplier: f64,
    pub scale_down_multiplier: f64,
    pub graceful_shutdown_timeout: Duration,
    pub process_startup_delay: Duration,
    pub broker: BrokerConfig,
}

/// A violated configuration invariant, fatal at startup per spec.md §7.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("queue_name must not be empty")]
    EmptyQueueName,
    #[error("worker_command must have a non-empty program path")]
    EmptyWorkerCommand,
    #[error("min_processes must be greater than 0")]
    NonPositiveMin,
    #[error("min_processes ({min}) must be <= max_processes ({max})")]
    MinExceedsMax { min: u32, max: u32 },
    #[error("check_interval must be a positive duration")]
    NonPositiveCheckInterval,
    #[error("scale_up_multiplier must be a positive rational")]
    NonPositiveScaleUpMultiplier,
    #[error("scale_down_multiplier must be a positive rational")]
    NonPositiveScaleDownMultiplier,
    #[error("scale_down_multiplier ({down}) must be less than scale_up_multiplier ({up})")]
    ScaleDownNotLessThanScaleUp { down: f64, up: f64 },
    #[error("graceful_shutdown_timeout must be a positive duration")]
    NonPositiveGracefulShutdownTimeout,
    #[error("process_startup_delay must be a positive duration")]
    NonPositiveProcessStartupDelay,
}

impl Config {
    /// Validate and construct a `Config`. This is the only way to obtain
    /// one — an existing `Config` is therefore always valid.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue_name: String,
        worker_command: WorkerCommand,
        min_processes: u32,
        max_processes: u32,
        check_interval: Duration,
        scale_up_multiplier: f64,
        scale_down_multiplier: f64,
        graceful_shutdown_timeout: Duration,
        process_startup_delay: Duration,
        broker: BrokerConfig,
    ) -> Result<Self, ConfigError> {
        if queue_name.trim().is_empty() {
            return Err(ConfigError::EmptyQueueName);
        }
        if worker_command.program.as_os_str().is_empty() {
            return Err(ConfigError::EmptyWorkerCommand);
        }
        if min_processes == 0 {
            return Err(ConfigError::NonPositiveMin);
        }
        if min_processes > max_processes {
            return Err(ConfigError::MinExceedsMax { min: min_processes, max: max_processes });
        }
        if check_interval.is_zero() {
            return Err(ConfigError::NonPositiveCheckInterval);
        }
        if scale_up_multiplier <= 0.0 {
            return Err(ConfigError::NonPositiveScaleUpMultiplier);
        }
        if scale_down_multiplier <= 0.0 {
            return Err(ConfigError::NonPositiveScaleDownMultiplier);
        }
        if scale_down_multiplier >= scale_up_multiplier {
            return Err(ConfigError::ScaleDownNotLessThanScaleUp {
                down: scale_down_multiplier,
                up: scale_up_multiplier,
            });
        }
        if graceful_shutdown_timeout.is_zero() {
            return Err(ConfigError::NonPositiveGracefulShutdownTimeout);
        }
        if process_startup_delay.is_zero() {
            return Err(ConfigError::NonPositiveProcessStartupDelay);
        }

        Ok(Self {
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
        })
    }

    /// Clamp a requested initial worker count into `[min, max]` (spec.md §6,
    /// `start`'s "optional initial count" argument).
    pub fn clamp_initial_count(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.min_processes)
            .clamp(self.min_processes, self.max_processes)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
