// SPDX-License-Identifier: MIT

//! `flotilla start` — run the Supervisor in the foreground.

use flotilla_adapters::{OsProcessSpawner, RedisProbe};
use flotilla_core::{QueueDepthProbe, SystemClock};
use flotilla_daemon::{bind_control_socket, config, env, Fleet, Supervisor};
use std::sync::Arc;

/// Exit codes from spec.md §6: 0 clean shutdown, 1 startup validation
/// failure, 2 broker unreachable at startup.
pub async fn start(initial_count: Option<u32>) -> i32 {
    let cfg = match config::from_env() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            eprintln!("configuration error: {e}");
            return 1;
        }
    };

    let state_dir = match env::state_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("{e}");
            return 1;
        }
    };

    let (listener, _lock_file) = match bind_control_socket(&state_dir) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("{e}");
            return 1;
        }
    };

    let probe = match RedisProbe::new(&cfg.broker, cfg.check_interval / 3) {
        Ok(probe) => Arc::new(probe),
        Err(e) => {
            eprintln!("failed to build the broker probe: {e}");
            return 2;
        }
    };
    if let Err(e) = probe.depth(&cfg.queue_name).await {
        eprintln!("broker unreachable at startup: {e}");
        return 2;
    }

    let spawner = OsProcessSpawner::new(cfg.worker_command.clone());
    let fleet = Arc::new(Fleet::new(
        spawner,
        SystemClock,
        cfg.min_processes,
        cfg.max_processes,
        cfg.process_startup_delay,
        cfg.graceful_shutdown_timeout,
    ));
    let supervisor = Arc::new(Supervisor::new(fleet, probe, cfg));

    supervisor.run(listener, initial_count).await;
    0
}
