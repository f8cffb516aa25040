//! Tracing setup
//!
//! The CLI logs to daily files named `daybook.<YYYY-MM-DD>.log` in
//! [`Config::state_dir`]. `RUST_LOG` overrides the configured level.

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Flushes buffered log lines when dropped; hold it until exit.
pub struct LoggingGuard {
    _worker: WorkerGuard,
}

/// `RUST_LOG` if set and valid, then the configured directive, then "info".
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn daily_appender(dir: &Path, max_files: usize) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("daybook")
        .filename_suffix("log")
        .max_log_files(max_files.max(1))
        .build(dir)
        .map_err(|e| Error::Config(format!("cannot log to {}: {}", dir.display(), e)))
}

/// Install the global subscriber writing to the state directory.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let dir = Config::state_dir();
    let (writer, worker) = tracing_appender::non_blocking(daily_appender(&dir, config.max_files)?);

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|e| Error::Config(format!("logging already initialized: {}", e)))?;

    tracing::debug!(dir = %dir.display(), level = %config.level, "Logging to file");
    Ok(LoggingGuard { _worker: worker })
}

/// Route logs to the test harness's captured output. Safe to call from
/// every test.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_span_events(FmtSpan::CLOSE)
        .with_test_writer()
        .try_init();
}
