//! Structured logging for Heron.
//!
//! Heron's crates log through `tracing` macros. This module installs the
//! subscriber that turns those events into output: JSON lines for
//! production, a pretty human-readable format for development.
//!
//! # Example
//!
//! ```rust,ignore
//! use heron_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//!
//! tracing::debug!(handler = "/users", "dispatching");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive (e.g., "info", "heron_invoke=trace,warn").
    pub level: String,

    /// Whether to output JSON format.
    pub json_format: bool,

    /// Whether to include span events (new, close).
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include thread IDs.
    pub thread_ids: bool,

    /// Whether to include target (module path).
    pub include_target: bool,

    /// Whether to emit ANSI colour codes (pretty format only).
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            thread_ids: false,
            include_target: true,
            ansi: true,
        }
    }

    /// Creates a production configuration with JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
            ansi: false,
        }
    }
}

/// Installs the global `tracing` subscriber described by `config`.
///
/// Does nothing when logging is disabled.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidConfig`] for an unparseable filter and
/// [`TelemetryError::LoggingInit`] if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_thread_ids(config.thread_ids)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_ansi(config.ansi)
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_thread_ids(config.thread_ids)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    Ok(())
}

/// Parses a filter directive string.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidConfig`] if the directive is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::InvalidConfig(format!("invalid log filter '{filter}': {e}")))
}

/// Standard log field names used across Heron crates.
pub mod fields {
    /// Handler method name or signature.
    pub const HANDLER: &str = "handler";

    /// Method signature.
    pub const METHOD: &str = "method";

    /// Zero-based parameter index.
    pub const PARAM_INDEX: &str = "param_index";

    /// Declared parameter type.
    pub const PARAM_TYPE: &str = "param_type";

    /// Registered URL path.
    pub const URL: &str = "url";

    /// Name of a registered object.
    pub const BEAN_NAME: &str = "bean_name";

    /// Path of the request being dispatched.
    pub const REQUEST_PATH: &str = "request_path";

    /// Request ID.
    pub const REQUEST_ID: &str = "request_id";

    /// Error field name.
    pub const ERROR: &str = "error";
}

/// Logs the start of a dispatch.
#[macro_export]
macro_rules! log_dispatch_start {
    ($request_id:expr, $path:expr, $handler:expr) => {
        tracing::debug!(
            request_id = %$request_id,
            request_path = %$path,
            handler = %$handler,
            "dispatching request"
        );
    };
}

/// Logs a failed dispatch.
#[macro_export]
macro_rules! log_dispatch_error {
    ($request_id:expr, $path:expr, $error:expr) => {
        tracing::debug!(
            request_id = %$request_id,
            request_path = %$path,
            error = %$error,
            "dispatch failed"
        );
    };
}
