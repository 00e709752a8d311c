// SPDX-License-Identifier: MIT

//! The flotilla daemon: fleet management, autoscaling, and the operator
//! control surface (spec.md §4).

pub mod autoscaler;
pub mod config;
pub mod env;
pub mod fleet;
pub mod listener;
pub mod protocol;
pub mod supervisor;

pub use autoscaler::{AutoScaler, Decision};
pub use config::ConfigLoadError;
pub use fleet::{Fleet, FleetSize, WorkerSnapshot};
pub use listener::ControlContext;
pub use protocol::{Request, Response, StatusReport, WorkerStatus};
pub use supervisor::{bind_control_socket, watch_signals, Supervisor, SupervisorError, SupervisorState};
