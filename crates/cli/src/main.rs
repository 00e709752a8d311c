// SPDX-License-Identifier: MIT

//! `flotilla` — CLI front-end for the autoscaling process supervisor
//! (spec.md §6).

mod client;
mod commands;
mod logging;

use clap::{Parser, Subcommand};
use flotilla_daemon::env;

#[derive(Parser)]
#[command(name = "flotilla", about = "Autoscaling process supervisor", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the supervisor in the foreground until signaled.
    Start {
        /// Initial worker count (defaults to MIN_PROCESSES, clamped to [min, max]).
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        count: Option<u32>,
    },
    /// Print current depth, fleet size, bounds, and per-worker state.
    Status,
    /// Request the fleet grow by `k` workers.
    ScaleUp {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        k: u32,
    },
    /// Request the fleet shrink by `k` workers.
    ScaleDown {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        k: u32,
    },
    /// Initiate orderly shutdown of a running supervisor.
    Stop,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let _log_guard = logging::init();

    if let Command::Start { count } = cli.command {
        std::process::exit(commands::start(count).await);
    }

    let state_dir = match env::state_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    let socket_path = state_dir.join("daemon.sock");
    let timeout = env::ipc_timeout();

    let exit_code = match cli.command {
        Command::Status => commands::status(&socket_path, timeout).await,
        Command::ScaleUp { k } => commands::scale_up(&socket_path, timeout, k).await,
        Command::ScaleDown { k } => commands::scale_down(&socket_path, timeout, k).await,
        Command::Stop => commands::stop(&socket_path, timeout).await,
        Command::Start { .. } => unreachable!("handled above"),
    };

    std::process::exit(exit_code);
}
