//! Logging configuration
//!
//! Everything here deserializes with defaults for missing fields, so a
//! config file only has to name what it changes.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level for targets without their own entry. `RUST_LOG` wins when set.
    pub level: String,
    pub console: ConsoleOutput,
    pub file: Option<FileOutput>,
    /// Field layout shared by JSON console and file output
    pub json: JsonFields,
    /// Per-target levels, e.g. `hearth_ledger = "trace"`
    pub targets: BTreeMap<String, String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: ConsoleOutput::default(),
            file: None,
            json: JsonFields::default(),
            targets: BTreeMap::new(),
        }
    }
}

impl LogConfig {
    /// Pretty, colored console output at debug
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            console: ConsoleOutput {
                format: ConsoleFormat::Pretty,
                ansi: true,
                ..ConsoleOutput::default()
            },
            ..Self::default()
        }
    }

    /// JSON files in `log_dir`, rotated daily, no console
    pub fn production(log_dir: PathBuf) -> Self {
        Self {
            console: ConsoleOutput {
                enabled: false,
                ..ConsoleOutput::default()
            },
            file: Some(FileOutput {
                directory: log_dir,
                ..FileOutput::default()
            }),
            ..Self::default()
        }
    }

    /// A single JSON file of warnings: every skipped operation and dropped
    /// correlation from one replay run
    pub fn replay_audit(log_dir: PathBuf) -> Self {
        Self {
            level: "warn".to_string(),
            console: ConsoleOutput {
                enabled: false,
                ..ConsoleOutput::default()
            },
            file: Some(FileOutput {
                directory: log_dir,
                prefix: "hearth-replay".to_string(),
                rotation: Rotation::Never,
            }),
            ..Self::default()
        }
    }

    /// Warnings only, written through the test harness so they are captured
    pub fn testing() -> Self {
        Self {
            level: "warn".to_string(),
            console: ConsoleOutput {
                format: ConsoleFormat::Pretty,
                capture: true,
                ..ConsoleOutput::default()
            },
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_target_level(
        mut self,
        target: impl Into<String>,
        level: impl Into<String>,
    ) -> Self {
        self.targets.insert(target.into(), level.into());
        self
    }

    /// `EnvFilter` directives: the base level, then per-target levels
    pub fn filter_directives(&self) -> String {
        let mut directives = vec![self.level.clone()];
        directives.extend(
            self.targets
                .iter()
                .map(|(target, level)| format!("{}={}", target, level)),
        );
        directives.join(",")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleFormat {
    Pretty,
    #[default]
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleOutput {
    pub enabled: bool,
    pub format: ConsoleFormat,
    pub ansi: bool,
    /// Write through libtest's capture instead of raw stdout
    pub capture: bool,
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self {
            enabled: true,
            format: ConsoleFormat::Json,
            ansi: false,
            capture: false,
        }
    }
}

/// JSON log files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutput {
    pub directory: PathBuf,
    pub prefix: String,
    pub rotation: Rotation,
}

impl Default for FileOutput {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./logs"),
            prefix: "hearth".to_string(),
            rotation: Rotation::Daily,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    #[default]
    Daily,
    Hourly,
    /// One `<prefix>.log`, truncated when logging starts
    Never,
}

/// Which fields JSON lines carry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonFields {
    /// Event fields at the top level rather than under `fields`
    pub flatten: bool,
    pub span_list: bool,
    pub current_span: bool,
    /// File and line of the call site
    pub source_location: bool,
}

impl Default for JsonFields {
    fn default() -> Self {
        Self {
            flatten: true,
            span_list: true,
            current_span: true,
            source_location: false,
        }
    }
}
