use crate::storage::project_dirs;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "tasktui.log";

/// Platform data directory, known before any config is read.
pub fn default_log_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Turns on file logging for development sessions.
///
/// The terminal belongs to the UI, so logs only ever go to
/// `<log_dir>/tasktui.log`. Nothing is installed unless `ENV=development`
/// or `TASKTUI_LOG` is set. Keep the returned guard alive until exit so
/// buffered lines get flushed.
pub fn init(log_dir: &Path) -> Result<Option<WorkerGuard>> {
    if !enabled() {
        return Ok(None);
    }
    fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;
    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))?;
    Ok(Some(guard))
}

fn enabled() -> bool {
    let development = env::var("ENV")
        .map(|v| v.eq_ignore_ascii_case("development"))
        .unwrap_or(false);
    development || env::var_os("TASKTUI_LOG").is_some()
}
