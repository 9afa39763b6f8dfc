//! Diagnostic logging to stderr or a file.
//!
//! Level precedence: `--log-level` / `-v`, then `COSTCALC_LOG`, then the
//! config file's `general.log_level`, then `warn`. `RUST_LOG` replaces the
//! whole filter when set.

use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub const LOG_LEVEL_ENV: &str = "COSTCALC_LOG";
pub const LOG_FORMAT_ENV: &str = "COSTCALC_LOG_FORMAT";
pub const LOG_FILE_ENV: &str = "COSTCALC_LOG_FILE";

/// Target prefix the default filter applies to.
const CRATE_TARGET: &str = "costcalc";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per event.
    Json,
    Compact,
}

impl LogFormat {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "human" | "pretty" => Some(Self::Human),
            "json" | "jsonl" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Minimum level of emitted events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "verbose" | "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" | "critical" => Some(Self::Error),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// `EnvFilter` directive restricting output to this crate.
    #[must_use]
    pub fn directive(self) -> String {
        format!("{CRATE_TARGET}={}", self.as_filter())
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Level from `COSTCALC_LOG`, if set and valid.
#[must_use]
pub fn level_from_env() -> Option<LogLevel> {
    env_value(LOG_LEVEL_ENV).and_then(|value| LogLevel::from_arg(&value))
}

/// Format from `COSTCALC_LOG_FORMAT`, if set and valid.
#[must_use]
pub fn format_from_env() -> Option<LogFormat> {
    env_value(LOG_FORMAT_ENV).and_then(|value| LogFormat::from_arg(&value))
}

/// Log file from `COSTCALC_LOG_FILE`.
#[must_use]
pub fn file_from_env() -> Option<PathBuf> {
    env_value(LOG_FILE_ENV).map(PathBuf::from)
}

/// Fully resolved logging setup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LogLevel,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

impl LogSettings {
    /// Combine CLI flags, environment and config file settings.
    ///
    /// `verbose` raises the level to at least `debug`; `json_output` forces
    /// JSON events regardless of `COSTCALC_LOG_FORMAT`.
    #[must_use]
    pub fn resolve(
        cli_level: Option<&str>,
        verbose: bool,
        json_output: bool,
        config_level: Option<&str>,
    ) -> Self {
        let level = cli_level
            .and_then(LogLevel::from_arg)
            .or_else(level_from_env)
            .or_else(|| config_level.and_then(LogLevel::from_arg))
            .unwrap_or_default();
        let level = if verbose {
            level.min(LogLevel::Debug)
        } else {
            level
        };

        let format = if json_output {
            LogFormat::Json
        } else {
            format_from_env().unwrap_or_default()
        };

        Self {
            level,
            format,
            file: file_from_env(),
        }
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(settings: &LogSettings) {
    let file = settings.file.as_ref().and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    let writer = match file {
        Some(file) => BoxMakeWriter::new(file),
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.directive()));

    match settings.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_writer(writer)
                .with_span_events(FmtSpan::CLOSE)
                .try_init()
                .ok();
        }
        LogFormat::Compact => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .compact()
                .with_writer(writer)
                .with_target(true)
                .try_init()
                .ok();
        }
        LogFormat::Human => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_target(false)
                .without_time()
                .try_init()
                .ok();
        }
    }
}
