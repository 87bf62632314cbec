//! Configuration loader with layered approach.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, HeronConfig, LogFormat, UrlStrategyKind};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values (or a development/production preset)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use heron_config::ConfigLoader;
///
/// # fn main() -> Result<(), heron_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_dotenv()?
///     .with_optional_file("heron.toml")?
///     .with_env_prefix("HERON")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: HeronConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader starting from the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HeronConfig::default(),
            env_prefix: None,
        }
    }

    /// Start from the development preset.
    ///
    /// ```
    /// use heron_config::{ConfigLoader, LogFormat};
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.format, LogFormat::Pretty);
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = HeronConfig::development();
        self
    }

    /// Start from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = HeronConfig::production();
        self
    }

    /// Load configuration from a file. The format follows the extension
    /// (`.toml` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file does not exist, cannot be read, is
    /// malformed, or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        self.config = parse(&content, &extension)
            .map_err(|e| match e {
                ConfigError::UnsupportedFormat(_) => {
                    ConfigError::UnsupportedFormat(path.display().to_string())
                }
                other => other,
            })?;

        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Same as [`with_file`](Self::with_file) when the file exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format ("toml" or
    /// "json").
    ///
    /// ```
    /// use heron_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [mapping]
    ///     strategy = "declared"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.mapping.strategy, heron_config::UrlStrategyKind::Declared);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unknown.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// Variables use the form `PREFIX__SECTION__KEY`, for example
    /// `HERON__MAPPING__DETECT_IN_ANCESTORS=true` or
    /// `HERON__LOGGING__LEVEL=debug`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load variables from a `.env` file in the working directory, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Dotenv`] if a `.env` file exists but cannot be
    /// parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply environment overrides, validate and return the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or validation
    /// fails.
    pub fn load(mut self) -> Result<HeronConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars: BTreeMap<String, String> = env::vars()
                .filter(|(k, _)| k.starts_with(&prefix))
                .collect();
            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the configuration without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> HeronConfig {
        self.config
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(path) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            // Shares the prefix but not the separator, e.g. HERONX_FOO.
            return Ok(());
        };
        let parts: Vec<&str> = path.split("__").collect();
        let bool_value = || {
            parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
        };

        match parts.as_slice() {
            ["MAPPING", "DETECT_IN_ANCESTORS"] => {
                self.config.mapping.detect_in_ancestors = bool_value()?;
            }
            ["MAPPING", "PATH_SEPARATOR_REQUIRED"] => {
                self.config.mapping.path_separator_required = bool_value()?;
            }
            ["MAPPING", "STRATEGY"] => {
                self.config.mapping.strategy = match value.to_lowercase().as_str() {
                    "bean_name" => UrlStrategyKind::BeanName,
                    "declared" => UrlStrategyKind::Declared,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'bean_name' or 'declared'",
                        ))
                    }
                };
            }

            ["INVOCATION", "TRACE_ARGUMENTS"] => {
                self.config.invocation.trace_arguments = bool_value()?;
            }
            ["INVOCATION", "CATCH_PANICS"] => {
                self.config.invocation.catch_panics = bool_value()?;
            }

            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled = bool_value()?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "ANSI_ENABLED"] => {
                self.config.logging.ansi_enabled = bool_value()?;
            }
            ["LOGGING", "INCLUDE_LOCATION"] => {
                self.config.logging.include_location = bool_value()?;
            }

            _ => {}
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<HeronConfig, ConfigError> {
    match format {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, HeronConfig::default());
    }

    #[test]
    fn test_loader_presets() {
        let dev = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(dev.logging.level, "debug");
        assert_eq!(dev.logging.format, LogFormat::Pretty);

        let prod = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(prod.logging.format, LogFormat::Json);
        assert!(!prod.invocation.trace_arguments);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"invocation": {"catch_panics": false}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "JSON")
            .unwrap()
            .load()
            .unwrap();
        assert!(!config.invocation.catch_panics);
        assert!(config.invocation.trace_arguments);
    }

    #[test]
    fn test_loader_with_unknown_format() {
        let err = ConfigLoader::new().with_string("", "yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(f) if f == "yaml"));
    }

    #[test]
    fn test_loader_with_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [mapping]
            detect_in_ancestors = true
            strategy = "declared"
            path_separator_required = false

            [logging]
            level = "heron_mapping=trace,info"
            format = "pretty"
            "#
        )
        .unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert!(config.mapping.detect_in_ancestors);
        assert_eq!(config.mapping.strategy, UrlStrategyKind::Declared);
        assert!(!config.mapping.path_separator_required);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_loader_with_json_file_unknown_field() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"mapping": {{"eager": true}}}}"#).unwrap();

        let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::JsonError(_)));
    }

    #[test]
    fn test_loader_with_unsupported_file_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
        assert!(err.to_string().contains(".ini"));
    }

    #[test]
    fn test_loader_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/heron.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));

        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/heron.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, HeronConfig::default());
    }

    #[test]
    fn test_load_validates() {
        let toml = r#"
            [logging]
            level = "heron=shouting"
        "#;
        let loader = ConfigLoader::new().with_string(toml, "toml").unwrap();
        assert!(matches!(loader.load(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_apply_env_var_mapping() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__MAPPING__DETECT_IN_ANCESTORS", "yes", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__MAPPING__STRATEGY", "Declared", "TEST")
            .unwrap();
        assert!(loader.config.mapping.detect_in_ancestors);
        assert_eq!(loader.config.mapping.strategy, UrlStrategyKind::Declared);
    }

    #[test]
    fn test_apply_env_var_invocation_and_logging() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__INVOCATION__CATCH_PANICS", "off", "TEST")
            .unwrap();
        loader.apply_env_var("TEST__LOGGING__FORMAT", "pretty", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__LEVEL", "trace", "TEST").unwrap();
        assert!(!loader.config.invocation.catch_panics);
        assert_eq!(loader.config.logging.format, LogFormat::Pretty);
        assert_eq!(loader.config.logging.level, "trace");
    }

    #[test]
    fn test_apply_env_var_invalid_values() {
        let mut loader = ConfigLoader::new();
        assert!(loader
            .apply_env_var("TEST__INVOCATION__TRACE_ARGUMENTS", "maybe", "TEST")
            .is_err());
        assert!(loader
            .apply_env_var("TEST__MAPPING__STRATEGY", "annotations", "TEST")
            .is_err());
    }

    #[test]
    fn test_apply_env_var_ignores_unknown_keys() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__SERVER__PORT", "80", "TEST").unwrap();
        loader.apply_env_var("TESTING", "1", "TEST").unwrap();
        assert_eq!(loader.config, HeronConfig::default());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool(""), None);
    }
}
