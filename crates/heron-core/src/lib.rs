//! # Heron Core
//!
//! Core types for the Heron handler dispatch framework.
//!
//! This crate provides the foundational types shared by the resolver chain,
//! the invocable handler and the URL mapping:
//!
//! - [`TypeKey`] - Runtime identity of a static Rust type
//! - [`HandlerValue`] - Type-erased argument and return value
//! - [`MethodParameter`] - Descriptor of one handler parameter
//! - [`NativeRequest`] - HTTP request abstraction handed to resolvers
//! - [`ModelContainer`] - Shared per-request state resolvers may write to
//! - [`WebDataBinder`] / [`DataBinderFactory`] - String-to-type conversion support
//! - [`BeanRegistry`] - Named object registry with aliases
//! - [`ResolutionError`] - Failure to produce an argument from request data

#![doc(html_root_url = "https://docs.rs/heron-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod binder;
mod error;
mod model;
mod parameter;
pub mod registry;
mod request;
mod types;
mod value;

pub use binder::{ConversionService, DataBinderFactory, DefaultBinderFactory, WebDataBinder};
pub use error::{RequestSource, ResolutionError};
pub use model::{ModelContainer, ModelMap, RedirectAttributes, SessionStatus};
pub use parameter::{MethodId, MethodParameter};
pub use registry::{BeanRegistry, NameLookup, RegistryError};
pub use request::{NativeRequest, NativeRequestBuilder, PathVariables, RequestId};
pub use types::TypeKey;
pub use value::HandlerValue;
