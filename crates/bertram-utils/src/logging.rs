//! # Logging Utilities
//!
//! Logging infrastructure for Bertram using `tracing`.
//!
//! Reports go to stdout, so every console layer configured here writes to
//! stderr. This module provides:
//! - Pretty (development) and JSON (machine-readable) output
//! - Environment variable configuration
//! - An explicit level override for the `--log-level` flag
//! - Optional file output through `tracing-appender`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bertram_utils::init_logging;
//!
//! // Keep the guard alive for as long as file output should be flushed
//! let _guard = init_logging(None).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Log filter (e.g., `RUST_LOG=debug`, `RUST_LOG=bertram_core=trace`)
//! - `BERTRAM_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `BERTRAM_LOG_FILE`: Optional log file path; a directory gets a dated
//!   `YYYY-MM-DD-bertram.log` inside it

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format
pub const LOG_FORMAT_ENV: &str = "BERTRAM_LOG_FORMAT";

/// Environment variable naming the log file
pub const LOG_FILE_ENV: &str = "BERTRAM_LOG_FILE";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    Pretty,
    /// JSON lines
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    Error,
    Warn,
    /// Default when nothing else is configured
    Info,
    Debug,
    /// Per stack candidate output from the scanner
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
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

/// Keeps the background file writer alive
///
/// Dropping it flushes and stops file output. Console output is unaffected.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard
{
    _file: Option<WorkerGuard>,
}

/// Initialize logging from the environment
///
/// Priority for the filter:
/// 1. `level`, when given (from `--log-level`)
/// 2. `RUST_LOG` (supports module filters like `bertram_core=debug`)
/// 3. `warn`
///
/// The format comes from `BERTRAM_LOG_FORMAT`; an unrecognised value falls
/// back to pretty output.
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed or the log
/// file cannot be created.
pub fn init_logging(level: Option<LogLevel>) -> Result<LoggingGuard, LoggingError>
{
    let format = env::var(LOG_FORMAT_ENV)
        .ok()
        .and_then(|s| LogFormat::from_str(&s).ok())
        .unwrap_or(LogFormat::Pretty);
    let log_file = env::var_os(LOG_FILE_ENV).map(PathBuf::from);

    init_logging_with(format, level, log_file.as_deref())
}

/// Initialize logging with an explicit format and optional file
///
/// ## Errors
///
/// See [`init_logging`].
pub fn init_logging_with(
    format: LogFormat,
    level: Option<LogLevel>,
    log_file: Option<&Path>,
) -> Result<LoggingGuard, LoggingError>
{
    let mut layers: Vec<BoxedLayer> = vec![console_layer(format, build_filter(level))];

    let guard = match log_file {
        Some(path) => {
            let path = resolve_log_file(path)?;
            let file_appender = tracing_appender::rolling::never(
                path.parent().unwrap_or_else(|| Path::new(".")),
                path.file_name().unwrap_or_default(),
            );
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            layers.push(file_layer(format, non_blocking, build_filter(level)));
            Some(guard)
        }
        None => None,
    };

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;

    Ok(LoggingGuard { _file: guard })
}

fn build_filter(level: Option<LogLevel>) -> EnvFilter
{
    match level {
        Some(level) => EnvFilter::new(Level::from(level).to_string()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string())),
    }
}

fn console_layer(format: LogFormat, filter: EnvFilter) -> BoxedLayer
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_thread_names(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(true)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_names(true)
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

fn file_layer(format: LogFormat, writer: tracing_appender::non_blocking::NonBlocking, filter: EnvFilter) -> BoxedLayer
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(false)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

/// Expand a directory into a dated file inside it, creating the directory as needed
fn resolve_log_file(path: &Path) -> Result<PathBuf, LoggingError>
{
    if path.is_dir() {
        let today = Utc::now().format("%Y-%m-%d");
        return Ok(path.join(format!("{today}-bertram.log")));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(path.to_path_buf())
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}. Use 'pretty' or 'json'")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}. Use 'error', 'warn', 'info', 'debug', or 'trace'")]
    InvalidLevel(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
