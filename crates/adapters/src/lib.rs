// SPDX-License-Identifier: MIT

//! Concrete capabilities for the flotilla supervisor: real OS process
//! control and a Redis-backed queue-depth probe, plus `test-support`
//! fakes for both.

mod process;
mod redis_probe;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use process::{OsProcessHandle, OsProcessSpawner};
pub use redis_probe::RedisProbe;
