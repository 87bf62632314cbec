//! # Heron Invoke
//!
//! Invocable handler methods for the Heron handler dispatch framework.
//!
//! A [`HandlerMethod`] binds a typed async callable to a receiver object. An
//! [`InvocableHandlerMethod`] wraps it with a resolver chain and turns a
//! request into a call:
//!
//! 1. Each parameter is filled from a matching [`ProvidedArg`], or else by
//!    the first resolver in the chain that supports it
//! 2. The receiver and arguments are checked against the callable
//! 3. The handler runs; its value or its own error is returned
//!
//! ## Errors
//!
//! | Variant | Cause |
//! |---------|-------|
//! | [`InvocationError::ArgumentResolution`] | No provided value, no supporting resolver |
//! | [`InvocationError::Resolution`] | A resolver failed |
//! | [`InvocationError::ReceiverMismatch`] | Receiver is not of the declaring type |
//! | [`InvocationError::Invocation`] | Arguments do not fit, or the handler panicked |
//! | [`InvocationError::Target`] | The handler returned an error |
//!
//! ## Example
//!
//! ```rust
//! use heron_core::{DefaultBinderFactory, ModelContainer, NativeRequest};
//! use heron_invoke::{HandlerMethod, InvocableHandlerMethod};
//! use heron_resolve::{RequestParamResolver, ResolverChain};
//! use std::convert::Infallible;
//! use std::sync::Arc;
//!
//! struct Orders;
//!
//! impl Orders {
//!     async fn list(self: Arc<Self>, page: u32) -> Result<String, Infallible> {
//!         Ok(format!("page {page}"))
//!     }
//! }
//!
//! let method = HandlerMethod::new(Arc::new(Orders), "list", Orders::list);
//! let mut invocable = InvocableHandlerMethod::new(method);
//! invocable.set_parameter_names(["page"]);
//! invocable.set_resolvers(Arc::new(ResolverChain::new().with(RequestParamResolver::new())));
//! invocable.set_binder_factory(Arc::new(DefaultBinderFactory::default()));
//!
//! let request = NativeRequest::builder().uri("/orders?page=2").build();
//! let value = tokio_test::block_on(
//!     invocable.invoke_for_request(&request, &mut ModelContainer::new(), &[]),
//! )
//! .unwrap();
//! assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("page 2"));
//! ```

#![doc(html_root_url = "https://docs.rs/heron-invoke/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod handler;
mod invocable;
mod observer;
mod provided;

pub use error::{BoxError, HandlerFailure, InvocationError};
pub use handler::{ArgumentMismatch, HandlerFn, HandlerFuture, HandlerMethod};
pub use invocable::InvocableHandlerMethod;
pub use observer::{InvocationObserver, NoopObserver, TracingObserver};
pub use provided::ProvidedArg;
