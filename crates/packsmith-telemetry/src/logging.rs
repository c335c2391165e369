//! Logging configuration and setup.

use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{TelemetryError, TelemetryResult};

/// Environment variable holding an `EnvFilter` directive string that
/// replaces the configured level (e.g. `packsmith_core=trace`).
pub const LOG_ENV: &str = "PACKSMITH_LOG";

/// Environment variable naming a directory for daily-rolling log files.
pub const LOG_DIR_ENV: &str = "PACKSMITH_LOG_DIR";

/// File name prefix for rolling log files.
const FILE_PREFIX: &str = "packsmith.log";

/// Helper to convert init errors to our error type.
fn init_err<E: std::fmt::Display>(e: E) -> TelemetryError {
    TelemetryError::InitError(e.to_string())
}

/// Log format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human-readable format.
    Pretty,
    /// Compact single-line format (default for a CLI).
    #[default]
    Compact,
    /// JSON format for structured logging.
    Json,
    /// Full single-line format with all fields.
    Full,
}

/// Log output target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Log to stderr.
    #[default]
    Stderr,
    /// Log to a daily-rolling file inside the given directory.
    File(PathBuf),
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level filter (e.g., "warn", "debug", "trace").
    #[serde(default = "default_level")]
    pub level: String,
    /// Log format.
    #[serde(default)]
    pub format: LogFormat,
    /// Log target.
    #[serde(default)]
    pub target: LogTarget,
    /// Whether to include timestamps.
    #[serde(default = "default_true")]
    pub timestamps: bool,
    /// Whether to use ANSI colors. Defaults to whether stderr is a terminal.
    #[serde(default = "default_ansi")]
    pub ansi: bool,
    /// Directive overrides (e.g., `reqwest=warn`).
    #[serde(default)]
    pub directives: Vec<String>,
}

fn default_level() -> String {
    "warn".to_string()
}

fn default_true() -> bool {
    true
}

fn default_ansi() -> bool {
    std::io::stderr().is_terminal()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            target: LogTarget::default(),
            timestamps: true,
            ansi: default_ansi(),
            directives: Vec::new(),
        }
    }
}

impl LogConfig {
    /// Create a new log config with the specified level.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    /// Set the log format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Log to a daily-rolling file in `directory`.
    #[must_use]
    pub fn with_file_logging(mut self, directory: impl Into<PathBuf>) -> Self {
        self.target = LogTarget::File(directory.into());
        // No escape codes in files
        self.ansi = false;
        self
    }

    /// Add a directive override.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Apply [`LOG_ENV`] and [`LOG_DIR_ENV`] overrides.
    ///
    /// `lookup` is usually `|k| std::env::var(k).ok()`; taking it as a
    /// parameter keeps the overlay testable without touching the process
    /// environment. Empty values are ignored.
    #[must_use]
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(LOG_ENV).filter(|v| !v.trim().is_empty()) {
            self.level = level;
        }
        if let Some(dir) = lookup(LOG_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self = self.with_file_logging(dir);
        }
        self
    }

    /// Build the env filter from config.
    fn build_filter(&self) -> TelemetryResult<EnvFilter> {
        let mut filter = EnvFilter::try_new(&self.level)
            .map_err(|e| TelemetryError::ConfigError(e.to_string()))?;

        for directive in &self.directives {
            filter = filter.add_directive(directive.parse().map_err(
                |e: tracing_subscriber::filter::ParseError| {
                    TelemetryError::ConfigError(e.to_string())
                },
            )?);
        }

        Ok(filter)
    }
}

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Returns an error if a filter directive is invalid, the log directory
/// cannot be created, or a subscriber is already installed.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.build_filter()?;

    match &config.target {
        LogTarget::Stderr => install(filter, config, std::io::stderr),
        LogTarget::File(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                TelemetryError::ConfigError(format!(
                    "failed to create log directory {}: {e}",
                    dir.display()
                ))
            })?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, FILE_PREFIX);
            install(filter, config, appender)
        },
    }
}

fn install<W>(filter: EnvFilter, config: &LogConfig, writer: W) -> TelemetryResult<()>
where
    W: for<'a> fmt::MakeWriter<'a> + Send + Sync + 'static,
{
    let base = fmt::layer()
        .with_writer(writer)
        .with_ansi(config.ansi)
        .with_target(true);

    // Each formatter is a distinct layer type, hence one arm per format.
    match (config.format, config.timestamps) {
        (LogFormat::Json, true) => registry(filter).with(base.json()).try_init(),
        (LogFormat::Json, false) => registry(filter)
            .with(base.json().without_time())
            .try_init(),
        (LogFormat::Pretty, true) => registry(filter).with(base.pretty()).try_init(),
        (LogFormat::Pretty, false) => registry(filter)
            .with(base.pretty().without_time())
            .try_init(),
        (LogFormat::Compact, true) => registry(filter).with(base.compact()).try_init(),
        (LogFormat::Compact, false) => registry(filter)
            .with(base.compact().without_time())
            .try_init(),
        (LogFormat::Full, true) => registry(filter).with(base).try_init(),
        (LogFormat::Full, false) => registry(filter).with(base.without_time()).try_init(),
    }
    .map_err(init_err)
}

fn registry(
    filter: EnvFilter,
) -> tracing_subscriber::layer::Layered<EnvFilter, tracing_subscriber::Registry> {
    tracing_subscriber::registry().with(filter)
}
