//! # Logging Utilities
//!
//! Logging infrastructure for vexcept using `tracing`.
//!
//! This module provides structured logging with support for:
//! - JSON or pretty output
//! - Environment variable configuration
//! - An optional daily-rolled log file
//!
//! Console output always goes to **stderr**. Stdout belongs to the extracted
//! data, which may be raw binary.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vexcept_utils::init_logging;
//!
//! // Hold the guard for as long as the program runs
//! let _guard = init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Log filter (e.g., `RUST_LOG=debug`, `RUST_LOG=vexcept_protocol=trace`)
//! - `VEXCEPT_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `VEXCEPT_LOG_FILE`: Optional path to a log file (rolled daily)

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format
pub const LOG_FORMAT_ENV: &str = "VEXCEPT_LOG_FORMAT";

/// Environment variable naming the optional log file
pub const LOG_FILE_ENV: &str = "VEXCEPT_LOG_FILE";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    #[default]
    Pretty,
    /// JSON format, one object per line
    Json,
}

impl FromStr for LogFormat
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose, includes raw probe traffic)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

/// Keeps the background log file writer alive
///
/// Dropping it flushes and stops file logging. Console logging is unaffected.
#[derive(Debug)]
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard
{
    _file: Option<WorkerGuard>,
}

/// Initialize logging from the environment only
///
/// Reads `RUST_LOG`, `VEXCEPT_LOG_FORMAT` and `VEXCEPT_LOG_FILE`.
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `VEXCEPT_LOG_FORMAT` holds an unknown format
pub fn init_logging() -> Result<LoggingGuard, LoggingError>
{
    init_logging_with_level(None)
}

/// Initialize logging with an optional explicit level
///
/// Filter priority:
/// 1. `level`, if given (from `--log-level`)
/// 2. `RUST_LOG`, which may hold per-crate directives
/// 3. `info`
///
/// ## Example
///
/// ```rust,no_run
/// use vexcept_utils::{init_logging_with_level, LogLevel};
///
/// let _guard = init_logging_with_level(Some(LogLevel::Debug)).expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Same as [`init_logging`].
pub fn init_logging_with_level(level: Option<LogLevel>) -> Result<LoggingGuard, LoggingError>
{
    let format = match env::var(LOG_FORMAT_ENV) {
        Ok(value) => LogFormat::from_str(&value).map_err(LoggingError::InvalidFormat)?,
        Err(_) => LogFormat::default(),
    };
    let log_file = env::var(LOG_FILE_ENV).ok().map(PathBuf::from);

    init_logging_internal(format, level, log_file.as_deref())
}

fn build_filter(level: Option<LogLevel>) -> EnvFilter
{
    if let Some(level) = level {
        // Explicit level from CLI takes precedence
        EnvFilter::new(Level::from(level).to_string())
    } else if let Ok(rust_log) = env::var("RUST_LOG") {
        EnvFilter::try_new(&rust_log).unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()))
    } else {
        EnvFilter::new(Level::INFO.to_string())
    }
}

fn console_layer(format: LogFormat, filter: EnvFilter) -> BoxedLayer
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(true)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
    }
}

fn file_layer(format: LogFormat, filter: EnvFilter, path: &Path) -> Result<(BoxedLayer, WorkerGuard), LoggingError>
{
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InitializationFailed(format!("{} is not a file path", path.display())))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(directory)?;

    let file_appender = tracing_appender::rolling::daily(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let layer = match format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(non_blocking)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(false) // No ANSI in files
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    };

    Ok((layer, guard))
}

fn init_logging_internal(
    format: LogFormat,
    level: Option<LogLevel>,
    log_file: Option<&Path>,
) -> Result<LoggingGuard, LoggingError>
{
    let mut layers = Vec::with_capacity(2);
    let mut file_guard = None;

    if let Some(path) = log_file {
        let (layer, guard) = file_layer(format, build_filter(level), path)?;
        layers.push(layer);
        file_guard = Some(guard);
    }
    layers.push(console_layer(format, build_filter(level)));

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;

    Ok(LoggingGuard { _file: file_guard })
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("json").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("dev").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("prod").unwrap(), LogFormat::Json);
        assert!(LogFormat::from_str("invalid").is_err());
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);
        assert_eq!(LogLevel::from_str("warn").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("debug").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("TRACE").unwrap(), LogLevel::Trace);
        assert!(LogLevel::from_str("invalid").is_err());
    }

    #[test]
    fn test_log_level_to_tracing_level()
    {
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(LogLevel::Warn), Level::WARN);
        assert_eq!(Level::from(LogLevel::Info), Level::INFO);
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
    }

    #[test]
    fn test_default_format_is_pretty()
    {
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
    }

    #[test]
    fn test_explicit_level_wins()
    {
        let filter = build_filter(Some(LogLevel::Trace));
        assert!(filter.to_string().to_lowercase().contains("trace"));
    }
}
