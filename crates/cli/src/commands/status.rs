// SPDX-License-Identifier: MIT

//! `flotilla status` — print current depth, fleet size, bounds, and
//! per-worker state (spec.md §6).

use crate::client;
use flotilla_daemon::protocol::{Request, Response};
use std::path::Path;
use std::time::Duration;

pub async fn status(socket_path: &Path, timeout: Duration) -> i32 {
    match client::send(socket_path, timeout, &Request::Status).await {
        Ok(Response::Status(report)) => {
            println!("depth: {}", report.depth.map(|d| d.to_string()).unwrap_or_else(|| "unknown".into()));
            println!(
                "fleet: {} total ({} running, {} starting), bounds [{}, {}]",
                report.fleet_total, report.fleet_running, report.fleet_starting, report.min_processes, report.max_processes
            );
            println!("thresholds: up>{:.2}x, down<{:.2}x", report.scale_up_threshold, report.scale_down_threshold);
            println!("unexpected deaths since startup: {}", report.unexpected_deaths);
            for w in &report.workers {
                println!("  pid={} state={} uptime_ms={}", w.pid, w.state, w.uptime_ms);
            }
            0
        }
        Ok(other) => {
            eprintln!("unexpected response from the supervisor: {other:?}");
            1
        }
        Err(e) => {
            eprintln!("{e}");
            1
        }
    }
}
