//! Tracing subscriber setup.
//!
//! Chat mode logs to a rolling file under the app home: the TUI owns the
//! terminal, so stderr output would corrupt the alternate screen. Plain
//! subcommands log to stderr. Log level comes from GEMCHAT_LOG.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const ENV_FILTER_VAR: &str = "GEMCHAT_LOG";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(ENV_FILTER_VAR).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes rolling file logging for chat mode.
///
/// The returned guard flushes buffered log lines on drop; keep it alive for
/// the lifetime of the process.
pub fn init_file_logging(logs_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create {}", logs_dir.display()))?;

    let appender = tracing_appender::rolling::daily(logs_dir, "gemchat.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("Failed to set tracing subscriber: {err}"))?;

    Ok(guard)
}

/// Initializes stderr logging for non-TUI subcommands.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}
