// SPDX-License-Identifier: MIT

//! `flotilla scale-up` / `flotilla scale-down` — request a Fleet mutation
//! and print the count actually applied (spec.md §6).

use crate::client;
use flotilla_daemon::protocol::{Request, Response};
use std::path::Path;
use std::time::Duration;

pub async fn scale_up(socket_path: &Path, timeout: Duration, k: u32) -> i32 {
    scale(socket_path, timeout, Request::ScaleUp { k }, "actual_added").await
}

pub async fn scale_down(socket_path: &Path, timeout: Duration, k: u32) -> i32 {
    scale(socket_path, timeout, Request::ScaleDown { k }, "actual_removed").await
}

async fn scale(socket_path: &Path, timeout: Duration, request: Request, label: &str) -> i32 {
    match client::send(socket_path, timeout, &request).await {
        Ok(Response::Scaled { actual }) => {
            println!("{label}: {actual}");
            0
        }
        Ok(Response::Error { message }) => {
            eprintln!("{message}");
            1
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
