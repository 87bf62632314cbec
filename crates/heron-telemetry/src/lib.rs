//! Logging setup for Heron.
//!
//! Heron's crates emit `tracing` events while resolving arguments, invoking
//! handlers and detecting URL mappings. This crate installs a
//! `tracing-subscriber` pipeline for them and defines the field names those
//! events share (see [`logging::fields`]).
//!
//! | Level | Emitted for |
//! |-------|-------------|
//! | `trace` | Resolver selection, argument lists, return values, URL registrations |
//! | `debug` | Resolver failures, rejected bean names, dispatch failures |
//! | `warn` | Ambiguous pattern lookups, handler panics |
//!
//! # Example
//!
//! ```rust,ignore
//! use heron_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
