//! Process-wide `tracing` subscriber.
//!
//! The level comes from `RUST_LOG` and defaults to `info`.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

static INSTALLED: OnceCell<LogKind> = OnceCell::new();
static LOG_FILE: OnceCell<PathBuf> = OnceCell::new();

/// `LogKind` represents where the logs go: `stdout` or a log file.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LogKind {
    /// It logs to console, the default choice.
    Stdout,

    /// It logs on a file in `<temp dir>/armature-<timestamp>.log`.
    File,
}

/// Keeps the file writer alive. Dropping it flushes what is still buffered.
#[derive(Debug, Default)]
#[must_use = "dropping the guard stops the file writer"]
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the subscriber. Only the first call does anything.
///
/// When the host application already installed its own subscriber, that
/// one is kept and this call is a no-op as well.
///
/// # Errors
///
/// Fails when the log file cannot be created.
pub fn init_logger(kind: LogKind) -> io::Result<LogGuard> {
    if INSTALLED.set(kind).is_err() {
        return Ok(LogGuard::default());
    }

    match kind {
        LogKind::Stdout => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter())
                .try_init();
            Ok(LogGuard::default())
        }
        LogKind::File => {
            let filename = format!("armature-{}.log", Utc::now().timestamp());
            let path = std::env::temp_dir().join(filename);
            let file = File::create(&path)?;
            let (writer, worker) = tracing_appender::non_blocking(file);

            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(writer)
                .with_ansi(false)
                .try_init();

            println!("Logging to file: {}", path.display());
            let _ = LOG_FILE.set(path);
            Ok(LogGuard {
                _worker: Some(worker),
            })
        }
    }
}

/// The file the logs are written to, if [`LogKind::File`] was installed.
#[must_use]
pub fn log_file() -> Option<&'static Path> {
    LOG_FILE.get().map(PathBuf::as_path)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::{LogKind, init_logger, log_file};
    use pretty_assertions::assert_eq;

    #[test]
    fn logger_file() {
        let guard = init_logger(LogKind::File).unwrap();
        tracing::error!("ok");

        // second call is a no-op
        let second = init_logger(LogKind::Stdout).unwrap();
        drop(second);

        // dropping the guard flushes the writer
        drop(guard);

        let path = log_file().unwrap().to_path_buf();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("armature-"));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("log"));

        let content = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert!(content.contains("ok"), "{content}");
    }
}
