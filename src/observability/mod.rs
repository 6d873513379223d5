//! Observability setup.
//!
//! The library only emits `tracing` events and `metrics` facade updates. This
//! module installs a subscriber for the binary; no metrics recorder is
//! installed, so metric updates are no-ops unless the embedding process sets
//! one up.

mod logging;

pub use logging::{LogFormat, LoggingConfig};

use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static OBSERVABILITY_INIT: OnceLock<()> = OnceLock::new();

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if logging has already been initialized or if the log
/// file cannot be opened.
pub fn init(config: LoggingConfig) -> Result<()> {
    if OBSERVABILITY_INIT.get().is_some() {
        return Err(already_initialized());
    }

    match (&config.file, config.format) {
        (Some(log_file), LogFormat::Json) => {
            let writer = open_log_file(log_file)?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(writer)
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true),
                )
                .with(config.filter)
                .try_init()
                .map_err(init_error)?;
        },
        (Some(log_file), LogFormat::Pretty) => {
            let writer = open_log_file(log_file)?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true),
                )
                .with(config.filter)
                .try_init()
                .map_err(init_error)?;
        },
        (None, LogFormat::Json) => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(io::stderr)
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true),
                )
                .with(config.filter)
                .try_init()
                .map_err(init_error)?;
        },
        (None, LogFormat::Pretty) => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(io::stderr)
                        .with_target(true),
                )
                .with(config.filter)
                .try_init()
                .map_err(init_error)?;
        },
    }

    OBSERVABILITY_INIT.set(()).map_err(|()| already_initialized())
}

/// Thread-safe file writer for logging.
#[derive(Clone)]
struct LogFileWriter {
    file: Arc<Mutex<File>>,
}

impl Write for LogFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .file
            .lock()
            .map_err(|e| io::Error::other(e.to_string()))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|e| io::Error::other(e.to_string()))?;
        guard.flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogFileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Opens a log file for appending, creating parent directories.
fn open_log_file(path: &Path) -> Result<LogFileWriter> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
            operation: "create_log_dir".to_string(),
            cause: e.to_string(),
        })?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::OperationFailed {
            operation: "open_log_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

    Ok(LogFileWriter {
        file: Arc::new(Mutex::new(file)),
    })
}

fn already_initialized() -> Error {
    Error::OperationFailed {
        operation: "observability_init".to_string(),
        cause: "observability already initialized".to_string(),
    }
}

#[allow(clippy::needless_pass_by_value)]
fn init_error(e: tracing_subscriber::util::TryInitError) -> Error {
    Error::OperationFailed {
        operation: "observability_init".to_string(),
        cause: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_creates_parents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("logs").join("vecdb.log");
        let mut writer = open_log_file(&path).expect("open");
        writer.write_all(b"line\n").expect("write");
        writer.flush().expect("flush");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "line\n");
    }

    #[test]
    fn test_second_init_fails() {
        let first = init(LoggingConfig {
            filter: tracing_subscriber::EnvFilter::new("off"),
            format: LogFormat::Pretty,
            file: None,
        });
        let second = init(LoggingConfig {
            filter: tracing_subscriber::EnvFilter::new("off"),
            format: LogFormat::Json,
            file: None,
        });
        assert!(first.is_ok());
        assert!(matches!(second, Err(Error::OperationFailed { .. })));
    }
}
