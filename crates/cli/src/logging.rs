// SPDX-License-Identifier: MIT

//! Logging setup driven by `LOG_LEVEL`/`LOG_FILE` (spec.md §6).

use tracing_subscriber::EnvFilter;

/// Install a global subscriber. When `LOG_FILE` is set, logs go through a
/// non-blocking rolling writer instead of stderr; the returned guard must
/// be held for the process lifetime or buffered lines are lost on exit.
pub fn init() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_new(std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match std::env::var("LOG_FILE") {
        Ok(path) => {
            let path = std::path::PathBuf::from(path);
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("flotilla.log"));
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}
