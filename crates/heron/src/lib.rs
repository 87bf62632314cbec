//! # Heron
//!
//! **Handler dispatch and argument resolution**
//!
//! Heron maps request paths to handler methods registered by name, resolves
//! each handler argument from the request, and calls the handler:
//!
//! ```text
//! NativeRequest → UrlHandlerMapping → HandlerMethod ← ResolverChain
//!                        ↑                  ↓
//!                  BeanRegistry        HandlerValue / InvocationError
//! ```
//!
//! - [`heron_core`] - values, type keys, the request, per-request state, binders, the registry
//! - [`heron_resolve`] - the resolver chain and built-in resolvers
//! - [`heron_invoke`] - handler methods and their invocation
//! - [`heron_mapping`] - URL detection and lookup
//! - [`heron_config`] / [`heron_telemetry`] - configuration and logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use heron::prelude::*;
//!
//! let config = ConfigLoader::new().with_env_prefix("HERON").load()?;
//! heron::init_logging(&config)?;
//!
//! let dispatcher = Dispatcher::builder(registry)
//!     .config(config)
//!     .binder_factory(Arc::new(DefaultBinderFactory::default()))
//!     .build()?;
//!
//! let outcome = dispatcher.dispatch(&request).await?;
//! ```

#![doc(html_root_url = "https://docs.rs/heron/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod dispatcher;
mod error;

pub use dispatcher::{
    default_resolvers, DispatchOutcome, Dispatcher, DispatcherBuilder, ENV_PREFIX,
};
pub use error::DispatchError;

// Re-export member crates
pub use heron_config as config;
pub use heron_core as core;
pub use heron_invoke as invoke;
pub use heron_mapping as mapping;
pub use heron_resolve as resolve;
pub use heron_telemetry as telemetry;

/// Installs the logging subscriber described by `config.logging`.
///
/// # Errors
///
/// Fails if the log filter is invalid or a global subscriber is already set.
pub fn init_logging(config: &heron_config::HeronConfig) -> Result<(), heron_telemetry::TelemetryError> {
    heron_telemetry::init_logging(&config.logging.to_log_config())
}

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use heron::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{DispatchError, DispatchOutcome, Dispatcher};

    pub use heron_config::{ConfigLoader, HeronConfig};

    pub use heron_core::{
        BeanRegistry, ConversionService, DefaultBinderFactory, HandlerValue, ModelContainer,
        ModelMap, NativeRequest, RedirectAttributes, ResolutionError, SessionStatus, TypeKey,
    };

    pub use heron_invoke::{
        HandlerFailure, HandlerMethod, InvocableHandlerMethod, InvocationError, ProvidedArg,
    };

    pub use heron_mapping::{UrlHandlerMapping, UrlStrategy};

    pub use heron_resolve::{
        ArgumentResolver, FnResolver, PathVariableResolver, RequestBodyResolver,
        RequestHeaderResolver, RequestParamResolver, ResolverChain,
    };
}
