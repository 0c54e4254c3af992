//! Telemetry helpers for structured logging.

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (for example `"info"` or `"airport_tower=debug"`).
///
/// Does nothing if a global subscriber is already set, so embedders and
/// tests can install their own.
pub fn init_tracing(default_directive: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directive))
        .with_thread_names(true)
        .try_init();
}

/// Keeps the log file writer alive. Dropping it flushes and closes the file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Like [`init_tracing`], also writing every line to `log_file`.
///
/// Missing directories are created and an existing file is truncated. If a
/// global subscriber is already set the file is still created but stays
/// empty.
///
/// # Errors
///
/// Returns an error if the directory or the file cannot be created.
pub fn init_logging(default_directive: &str, log_file: &Path) -> Result<LoggingGuard, io::Error> {
    let dir = log_file.parent().unwrap_or_else(|| Path::new("."));
    let name = log_file
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "log path has no file name"))?;
    fs::create_dir_all(dir)?;
    fs::write(log_file, "")?;

    let (writer, file_guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_thread_names(true);
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_thread_names(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter(default_directive))
        .with(file_layer)
        .with(stdout_layer)
        .try_init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
