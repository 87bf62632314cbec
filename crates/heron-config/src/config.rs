//! Configuration types.
//!
//! [`HeronConfig`] is the root; each section has serde defaults so a file
//! only needs to mention what it changes. Unknown fields are rejected.

use heron_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Complete Heron configuration.
///
/// # Example
///
/// ```
/// use heron_config::{HeronConfig, UrlStrategyKind};
///
/// let config = HeronConfig::default();
/// assert_eq!(config.mapping.strategy, UrlStrategyKind::BeanName);
/// assert!(!config.mapping.detect_in_ancestors);
/// assert!(config.invocation.catch_panics);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HeronConfig {
    /// URL detection settings.
    #[serde(default)]
    pub mapping: MappingConfig,

    /// Handler invocation settings.
    #[serde(default)]
    pub invocation: InvocationConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HeronConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the log level is not a valid
    /// filter directive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }
        heron_telemetry::create_env_filter(&self.logging.level)
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        Ok(())
    }

    /// Development preset: debug pretty logs, argument tracing on.
    #[must_use]
    pub fn development() -> Self {
        Self {
            mapping: MappingConfig::default(),
            invocation: InvocationConfig {
                trace_arguments: true,
                catch_panics: true,
            },
            logging: LoggingConfig {
                enabled: true,
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                ansi_enabled: true,
                include_location: true,
            },
        }
    }

    /// Production preset: info JSON logs, argument values kept out of logs.
    #[must_use]
    pub fn production() -> Self {
        Self {
            mapping: MappingConfig::default(),
            invocation: InvocationConfig {
                trace_arguments: false,
                catch_panics: true,
            },
            logging: LoggingConfig::default(),
        }
    }
}

/// Which URLs a registered name serves.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UrlStrategyKind {
    /// The name and its aliases, when they start with `/`.
    #[default]
    BeanName,
    /// The URLs declared when the object was registered.
    Declared,
}

/// URL detection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MappingConfig {
    /// Also detect handlers registered in ancestor registries.
    #[serde(default)]
    pub detect_in_ancestors: bool,

    /// URL determination strategy.
    #[serde(default)]
    pub strategy: UrlStrategyKind,

    /// Reject URLs that do not start with `/` instead of prefixing them.
    #[serde(default = "default_true")]
    pub path_separator_required: bool,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            detect_in_ancestors: false,
            strategy: UrlStrategyKind::default(),
            path_separator_required: true,
        }
    }
}

/// Handler invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct InvocationConfig {
    /// Include argument and return values in trace events.
    #[serde(default = "default_true")]
    pub trace_arguments: bool,

    /// Turn handler panics into invocation errors.
    #[serde(default = "default_true")]
    pub catch_panics: bool,
}

impl Default for InvocationConfig {
    fn default() -> Self {
        Self {
            trace_arguments: true,
            catch_panics: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log filter directive (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Converts to the subscriber settings understood by `heron-telemetry`.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        let base = match self.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            file_line_info: self.include_location,
            ansi: self.ansi_enabled,
            ..base
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
