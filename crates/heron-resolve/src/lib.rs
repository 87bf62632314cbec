//! # Heron Resolve
//!
//! Argument resolution for the Heron handler dispatch framework.
//!
//! An [`ArgumentResolver`] answers two questions about a handler parameter:
//! can it produce a value for it, and what is that value for the current
//! request. A [`ResolverChain`] asks its resolvers in order and delegates to
//! the first one that supports the parameter.
//!
//! ## Built-in resolvers
//!
//! | Resolver | Parameter type | Source |
//! |----------|----------------|--------|
//! | [`RequestParamResolver`] | `String`, `Option<String>`, `Vec<String>`, simple types | Query string |
//! | [`PathVariableResolver`] | same | Path variables captured by routing |
//! | [`RequestHeaderResolver`] | same | Headers (`user_agent` reads `user-agent`) |
//! | [`RequestBodyResolver<T>`] | `T: DeserializeOwned` | JSON body |
//! | [`ModelContainerResolver`] | [`ModelMap`](heron_core::ModelMap) | Model in effect |
//! | [`RedirectAttributesResolver`] | [`RedirectAttributes`](heron_core::RedirectAttributes) | New redirect model |
//! | [`SessionStatusResolver`] | [`SessionStatus`](heron_core::SessionStatus) | Container's session status |
//! | [`RequestResolver`] | [`NativeRequest`](heron_core::NativeRequest) | The request itself |
//!
//! Named resolvers rely on parameter names, which are configured on the
//! handler method; unnamed parameters are never supported by them.
//!
//! ## Example
//!
//! ```rust
//! use heron_core::{DefaultBinderFactory, MethodId, MethodParameter, ModelContainer,
//!                  NativeRequest, TypeKey};
//! use heron_resolve::{ArgumentResolver, RequestParamResolver, ResolverChain};
//!
//! let chain = ResolverChain::new().with(RequestParamResolver::new());
//!
//! let parameter = MethodParameter::new(MethodId::next(), "list(u32)", 0, TypeKey::of::<u32>())
//!     .with_name("page");
//! let request = NativeRequest::builder().uri("/items?page=3").build();
//! let binders = DefaultBinderFactory::default();
//!
//! assert!(chain.supports_parameter(&parameter));
//! let value = chain
//!     .resolve_argument(&parameter, &mut ModelContainer::new(), &request, Some(&binders))
//!     .unwrap();
//! assert_eq!(value.downcast_ref::<u32>(), Some(&3));
//! ```

#![doc(html_root_url = "https://docs.rs/heron-resolve/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod chain;
mod model;
mod named;
mod resolver;

pub use body::{RequestBodyResolver, DEFAULT_MAX_BODY_SIZE};
pub use chain::ResolverChain;
pub use model::{
    ModelContainerResolver, RedirectAttributesResolver, RequestResolver, SessionStatusResolver,
};
pub use named::{PathVariableResolver, RequestHeaderResolver, RequestParamResolver};
pub use resolver::{ArgumentResolver, FnResolver};
