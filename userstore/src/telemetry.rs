//! Process-wide logging to a single file.
//!
//! Log lines render as `timestamp - target [LEVEL] file:line - message`,
//! with timestamps in a fixed regional timezone regardless of where the
//! process runs.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Europe::Moscow;
use tracing::{Event, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Default location of the process log file.
pub const DEFAULT_LOG_PATH: &str = "logs/app.log";

/// Errors raised while installing the log subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The log file (or its parent directory) could not be opened.
    #[error("failed to open log file {path}: {source}")]
    OpenLog {
        /// Path that failed to open.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber: {message}")]
    Install {
        /// Subscriber error message.
        message: String,
    },
}

/// Event formatter rendering `timestamp - target [LEVEL] file:line - message`.
struct LogLineFormat;

impl<S, N> FormatEvent<S, N> for LogLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = Utc::now().with_timezone(&Moscow);
        let metadata = event.metadata();
        write!(
            writer,
            "{} - {} [{}] {}:{} - ",
            timestamp.format("%Y-%m-%d %H:%M:%S"),
            metadata.target(),
            metadata.level(),
            metadata.file().unwrap_or("<unknown>"),
            metadata.line().unwrap_or(0),
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the process-wide subscriber writing to `path` in append mode.
///
/// Missing parent directories are created. The level filter comes from
/// `RUST_LOG` as usual.
///
/// # Errors
///
/// Returns [`TelemetryError::OpenLog`] when the file cannot be opened and
/// [`TelemetryError::Install`] when a global subscriber already exists.
pub fn init(path: impl AsRef<Path>) -> Result<(), TelemetryError> {
    let path = path.as_ref();
    let open_err = |source| TelemetryError::OpenLog {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(open_err)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(open_err)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .event_format(LogLineFormat)
        .with_writer(Arc::new(file))
        .try_init()
        .map_err(|err| TelemetryError::Install {
            message: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    //! End-to-end coverage for the file subscriber and its line format.

    use std::fs;

    use env_lock::lock_env;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn init_writes_formatted_lines_and_rejects_reinstall() {
        let _guard = lock_env([("RUST_LOG", Some("info".to_owned()))]);
        let dir = tempfile::tempdir().expect("temp dir");
        let log_path = dir.path().join("nested").join("app.log");

        init(&log_path).expect("first install succeeds");
        tracing::info!(target: "userstore::telemetry_test", "subscriber smoke line");

        let contents = fs::read_to_string(&log_path).expect("log file exists");
        let line = contents
            .lines()
            .find(|line| line.contains("subscriber smoke line"))
            .expect("line was written");
        assert!(line.contains("userstore::telemetry_test"));
        assert!(line.contains("[INFO]"));
        assert!(line.contains(" - "));

        let error = init(dir.path().join("other.log")).expect_err("second install fails");
        assert!(matches!(error, TelemetryError::Install { .. }));
    }
}
