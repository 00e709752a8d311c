// SPDX-License-Identifier: MIT

//! `flotilla stop` — request orderly shutdown (spec.md §6).

use crate::client;
use flotilla_daemon::protocol::{Request, Response};
use std::path::Path;
use std::time::Duration;

pub async fn stop(socket_path: &Path, timeout: Duration) -> i32 {
    match client::send(socket_path, timeout, &Request::Stop).await {
        Ok(Response::Ok) => {
            println!("stop requested");
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
