//! Core resolver trait.
//!
//! The [`ArgumentResolver`] trait is the extension point for producing
//! handler arguments from request data.

use heron_core::{
    DataBinderFactory, HandlerValue, MethodParameter, ModelContainer, NativeRequest,
    ResolutionError,
};
use std::fmt;

/// Strategy producing a value for a handler parameter.
///
/// Resolvers are shared across concurrent invocations, so they hold no
/// per-request state. Anything a resolver wants to hand to later resolvers
/// of the same invocation goes into the [`ModelContainer`].
///
/// # Implementing `ArgumentResolver`
///
/// ```rust
/// use heron_core::{DataBinderFactory, HandlerValue, MethodParameter, ModelContainer,
///                  NativeRequest, RequestSource, ResolutionError};
/// use heron_resolve::ArgumentResolver;
///
/// /// Resolves `ApiVersion` parameters from the `x-api-version` header.
/// #[derive(Debug, Clone, Copy)]
/// struct ApiVersion(u32);
///
/// struct ApiVersionResolver;
///
/// impl ArgumentResolver for ApiVersionResolver {
///     fn supports_parameter(&self, parameter: &MethodParameter) -> bool {
///         parameter.is::<ApiVersion>()
///     }
///
///     fn resolve_argument(
///         &self,
///         _parameter: &MethodParameter,
///         _container: &mut ModelContainer,
///         request: &NativeRequest,
///         _binder_factory: Option<&dyn DataBinderFactory>,
///     ) -> Result<HandlerValue, ResolutionError> {
///         let raw = request
///             .header("x-api-version")
///             .ok_or_else(|| ResolutionError::missing(RequestSource::Header, "x-api-version"))?;
///         let version = raw.parse().map_err(|_| {
///             ResolutionError::invalid_type(RequestSource::Header, "x-api-version", "expected integer")
///         })?;
///         Ok(HandlerValue::new(ApiVersion(version)))
///     }
/// }
/// ```
pub trait ArgumentResolver: Send + Sync {
    /// Returns `true` if this resolver can produce a value for `parameter`.
    fn supports_parameter(&self, parameter: &MethodParameter) -> bool;

    /// Produces the value for `parameter`.
    ///
    /// Only called for parameters [`supports_parameter`](Self::supports_parameter)
    /// accepted. `binder_factory` is `None` when the handler has no binder
    /// factory configured; resolvers that never convert ignore it.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolutionError`] when the request does not carry usable
    /// data for the parameter.
    fn resolve_argument(
        &self,
        parameter: &MethodParameter,
        container: &mut ModelContainer,
        request: &NativeRequest,
        binder_factory: Option<&dyn DataBinderFactory>,
    ) -> Result<HandlerValue, ResolutionError>;

    /// Name used in log output.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

type SupportsFn = Box<dyn Fn(&MethodParameter) -> bool + Send + Sync>;
type ResolveFn = Box<
    dyn Fn(&MethodParameter, &mut ModelContainer, &NativeRequest) -> Result<HandlerValue, ResolutionError>
        + Send
        + Sync,
>;

/// Resolver built from closures.
///
/// Handy for one-off strategies and tests.
///
/// ```rust
/// use heron_core::{HandlerValue, MethodId, MethodParameter, ModelContainer, NativeRequest, TypeKey};
/// use heron_resolve::{ArgumentResolver, FnResolver};
///
/// let resolver = FnResolver::constant(42_i64);
/// let parameter = MethodParameter::new(MethodId::next(), "f(i64)", 0, TypeKey::of::<i64>());
///
/// assert!(resolver.supports_parameter(&parameter));
/// let value = resolver
///     .resolve_argument(&parameter, &mut ModelContainer::new(), &NativeRequest::builder().build(), None)
///     .unwrap();
/// assert_eq!(value.downcast_ref::<i64>(), Some(&42));
/// ```
pub struct FnResolver {
    supports: SupportsFn,
    resolve: ResolveFn,
}

impl FnResolver {
    /// Creates a resolver from a support predicate and a resolve function.
    pub fn new<S, R>(supports: S, resolve: R) -> Self
    where
        S: Fn(&MethodParameter) -> bool + Send + Sync + 'static,
        R: Fn(&MethodParameter, &mut ModelContainer, &NativeRequest) -> Result<HandlerValue, ResolutionError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            supports: Box::new(supports),
            resolve: Box::new(resolve),
        }
    }

    /// Creates a resolver for every parameter of type `T`.
    pub fn for_type<T, R>(resolve: R) -> Self
    where
        T: 'static,
        R: Fn(&MethodParameter, &mut ModelContainer, &NativeRequest) -> Result<HandlerValue, ResolutionError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(MethodParameter::is::<T>, resolve)
    }

    /// Creates a resolver answering every `T` parameter with `value`.
    pub fn constant<T>(value: T) -> Self
    where
        T: Clone + fmt::Debug + Send + Sync + 'static,
    {
        let value = HandlerValue::new(value);
        Self::for_type::<T, _>(move |_, _, _| Ok(value.clone()))
    }
}

impl ArgumentResolver for FnResolver {
    fn supports_parameter(&self, parameter: &MethodParameter) -> bool {
        (self.supports)(parameter)
    }

    fn resolve_argument(
        &self,
        parameter: &MethodParameter,
        container: &mut ModelContainer,
        request: &NativeRequest,
        _binder_factory: Option<&dyn DataBinderFactory>,
    ) -> Result<HandlerValue, ResolutionError> {
        (self.resolve)(parameter, container, request)
    }
}

impl fmt::Debug for FnResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnResolver").finish_non_exhaustive()
    }
}
