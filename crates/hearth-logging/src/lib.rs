//! Structured logging setup for Hearth
//!
//! The engine crates only emit `tracing` events; this crate decides where
//! they go. Replay reports skipped operations and projection reports dropped
//! correlations at `warn`; fold progress is at `debug` and `trace`.
//!
//! # Outputs
//!
//! - **Console**: JSON lines (default) or pretty, human-readable text
//! - **Files**: JSON lines, rotated daily or hourly via tracing-appender
//! - **Filtering**: `RUST_LOG` when set, otherwise the configured levels
//!
//! # Quick Start
//!
//! ```ignore
//! use hearth_logging::{HearthSubscriberBuilder, LogConfig};
//!
//! // JSON lines to stdout
//! HearthSubscriberBuilder::new().init();
//!
//! // Pretty output, with replay internals at trace
//! HearthSubscriberBuilder::new()
//!     .with_config(LogConfig::development().with_target_level("hearth_ledger", "trace"))
//!     .init();
//!
//! // Keep the guard alive for as long as the file should receive events
//! let _guard = HearthSubscriberBuilder::new()
//!     .with_config(LogConfig::replay_audit("./audit".into()))
//!     .init();
//! ```

pub mod config;

pub use config::{ConsoleFormat, ConsoleOutput, FileOutput, JsonFields, LogConfig, Rotation};

use std::fs::{self, File};
use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, TestWriter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid filter directives: {0}")]
    Filter(String),

    #[error("Failed to open log file in {}: {}", .path.display(), .message)]
    File { path: PathBuf, message: String },

    #[error("Global subscriber already set: {0}")]
    AlreadyInitialized(String),
}

/// Builds and installs the global `tracing` subscriber
pub struct HearthSubscriberBuilder {
    config: LogConfig,
}

impl HearthSubscriberBuilder {
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.level = level.into();
        self
    }

    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console.enabled = enabled;
        self
    }

    pub fn with_file_output(mut self, file: FileOutput) -> Self {
        self.config.file = Some(file);
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Install the subscriber globally.
    ///
    /// With file output configured, the returned guard flushes buffered
    /// events on drop and must outlive the logging it covers.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(self.config.filter_directives())
                .map_err(|e| LoggingError::Filter(e.to_string()))?,
        };

        let LogConfig {
            console,
            file,
            json,
            ..
        } = &self.config;

        let pretty = console.enabled && console.format == ConsoleFormat::Pretty;
        let pretty_console = pretty.then(|| {
            tracing_subscriber::fmt::layer()
                .with_ansi(console.ansi)
                .with_target(true)
                .with_writer(console_writer(console))
        });

        let json_lines = console.enabled && console.format == ConsoleFormat::Json;
        let json_console = json_lines.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(json.flatten)
                .with_span_list(json.span_list)
                .with_current_span(json.current_span)
                .with_file(json.source_location)
                .with_line_number(json.source_location)
                .with_writer(console_writer(console))
        });

        let (json_file, guard) = match file {
            Some(file) => {
                let (writer, guard) = file_writer(file)?;
                let layer = tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(json.flatten)
                    .with_span_list(json.span_list)
                    .with_current_span(json.current_span)
                    .with_file(json.source_location)
                    .with_line_number(json.source_location)
                    .with_writer(writer);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        Registry::default()
            .with(filter)
            .with(pretty_console)
            .with(json_console)
            .with(json_file)
            .try_init()
            .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

        Ok(guard)
    }

    /// Like [`try_init`](Self::try_init), printing failures to stderr
    pub fn init(self) -> Option<WorkerGuard> {
        self.try_init().unwrap_or_else(|e| {
            eprintln!("Warning: logging not initialized: {}", e);
            None
        })
    }
}

impl Default for HearthSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn console_writer(console: &ConsoleOutput) -> BoxMakeWriter {
    if console.capture {
        BoxMakeWriter::new(TestWriter::new())
    } else {
        BoxMakeWriter::new(std::io::stdout)
    }
}

fn file_writer(file: &FileOutput) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    let file_error = |message: String| LoggingError::File {
        path: file.directory.clone(),
        message,
    };

    let rotation = match file.rotation {
        Rotation::Daily => rolling::Rotation::DAILY,
        Rotation::Hourly => rolling::Rotation::HOURLY,
        Rotation::Never => {
            fs::create_dir_all(&file.directory).map_err(|e| file_error(e.to_string()))?;
            let path = file.directory.join(format!("{}.log", file.prefix));
            let handle = File::create(&path).map_err(|e| file_error(e.to_string()))?;
            return Ok(tracing_appender::non_blocking(handle));
        }
    };

    let appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(file.prefix.as_str())
        .build(&file.directory)
        .map_err(|e| file_error(e.to_string()))?;
    Ok(tracing_appender::non_blocking(appender))
}

/// JSON lines to stdout at `info`
pub fn init_default() {
    HearthSubscriberBuilder::new().init();
}

/// Pretty console output at `debug`
pub fn init_development() {
    HearthSubscriberBuilder::new()
        .with_config(LogConfig::development())
        .init();
}

/// Captured warnings for tests. Safe to call from every test.
pub fn init_testing() {
    let _ = HearthSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = HearthSubscriberBuilder::new();
        assert_eq!(builder.config().level, "info");
        assert_eq!(builder.config().console.format, ConsoleFormat::Json);
    }

    #[test]
    fn test_builder_overrides() {
        let builder = HearthSubscriberBuilder::new()
            .with_config(LogConfig::development())
            .with_level("trace")
            .with_console(false)
            .with_file_output(FileOutput::default());
        assert_eq!(builder.config().level, "trace");
        assert!(!builder.config().console.enabled);
        assert_eq!(builder.config().file.as_ref().unwrap().prefix, "hearth");
    }

    #[test]
    fn test_init_testing_is_repeatable() {
        init_testing();
        init_testing();
        tracing::warn!(operation_id = "op-1", "logged after repeated init");
    }

    #[test]
    fn test_error_display() {
        let err = LoggingError::File {
            path: PathBuf::from("/nope"),
            message: "denied".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/nope"));
        assert!(msg.contains("denied"));
    }
}
