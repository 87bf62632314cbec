//! Typed configuration for Heron.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides (`PREFIX__SECTION__KEY`)
//! - Strict parsing: unknown fields are errors
//!
//! # Configuration File Format
//!
//! ```toml
//! [mapping]
//! detect_in_ancestors = false
//! strategy = "bean_name"        # or "declared"
//! path_separator_required = true
//!
//! [invocation]
//! trace_arguments = true
//! catch_panics = true
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"               # or "pretty"
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod loader;

pub use config::{
    HeronConfig, InvocationConfig, LogFormat, LoggingConfig, MappingConfig, UrlStrategyKind,
};
pub use error::ConfigError;
pub use loader::ConfigLoader;
