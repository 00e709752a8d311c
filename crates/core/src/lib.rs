// SPDX-License-Identifier: MIT

//! Data model and capability contracts for the flotilla autoscaling
//! process supervisor. No I/O lives here — see `flotilla-adapters` for
//! concrete process spawning and queue-depth probing.

pub mod macros;

mod clock;
mod config;
mod probe;
mod worker;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{BrokerConfig, Config, ConfigError, WorkerCommand};
pub use probe::{ProbeError, QueueDepthProbe};
pub use worker::{ExitStatus, Pid, ProcessError, ProcessHandle, ProcessSpawner, SpawnError, WorkerHandle, WorkerState};
