//! JSON request body resolver.

use crate::ArgumentResolver;
use heron_core::{
    DataBinderFactory, HandlerValue, MethodParameter, ModelContainer, NativeRequest,
    RequestSource, ResolutionError,
};
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;

/// Default maximum body size (1MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Resolves parameters of type `T` by deserialising the JSON request body.
///
/// The request must declare `application/json` or a `+json` media type.
///
/// # Example
///
/// ```rust
/// use heron_core::{MethodId, MethodParameter, ModelContainer, NativeRequest, TypeKey};
/// use heron_resolve::{ArgumentResolver, RequestBodyResolver};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct CreateUser {
///     name: String,
/// }
///
/// let resolver = RequestBodyResolver::<CreateUser>::new();
/// let parameter = MethodParameter::new(MethodId::next(), "create(CreateUser)", 0,
///                                      TypeKey::of::<CreateUser>());
/// let request = NativeRequest::builder()
///     .header("content-type", "application/json")
///     .body(r#"{"name":"Alice"}"#)
///     .build();
///
/// let value = resolver
///     .resolve_argument(&parameter, &mut ModelContainer::new(), &request, None)
///     .unwrap();
/// assert_eq!(value.downcast_ref::<CreateUser>().unwrap().name, "Alice");
/// ```
pub struct RequestBodyResolver<T> {
    max_size: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> RequestBodyResolver<T> {
    /// Creates a resolver with the default size limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_BODY_SIZE)
    }

    /// Creates a resolver rejecting bodies larger than `max_size` bytes.
    #[must_use]
    pub fn with_limit(max_size: usize) -> Self {
        Self {
            max_size,
            _marker: PhantomData,
        }
    }

    /// Returns the size limit in bytes.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl<T> Default for RequestBodyResolver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for RequestBodyResolver<T> {
    fn clone(&self) -> Self {
        Self::with_limit(self.max_size)
    }
}

impl<T> fmt::Debug for RequestBodyResolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBodyResolver")
            .field("target", &std::any::type_name::<T>())
            .field("max_size", &self.max_size)
            .finish()
    }
}

fn is_json(content_type: &str) -> bool {
    content_type.parse::<mime::Mime>().is_ok_and(|mime| {
        mime.type_() == mime::APPLICATION
            && (mime.subtype() == mime::JSON || mime.suffix().is_some_and(|suffix| suffix == mime::JSON))
    })
}

impl<T> ArgumentResolver for RequestBodyResolver<T>
where
    T: DeserializeOwned + fmt::Debug + Send + Sync + 'static,
{
    fn supports_parameter(&self, parameter: &MethodParameter) -> bool {
        parameter.is::<T>()
    }

    fn resolve_argument(
        &self,
        _parameter: &MethodParameter,
        _container: &mut ModelContainer,
        request: &NativeRequest,
        _binder_factory: Option<&dyn DataBinderFactory>,
    ) -> Result<HandlerValue, ResolutionError> {
        let content_type = request.content_type();
        if !content_type.is_some_and(is_json) {
            return Err(ResolutionError::unsupported_media_type(
                mime::APPLICATION_JSON.as_ref(),
                content_type,
            ));
        }

        let body = request.body();
        if body.len() > self.max_size {
            return Err(ResolutionError::payload_too_large(self.max_size, body.len()));
        }
        if body.is_empty() {
            return Err(ResolutionError::deserialization_failed(
                RequestSource::Body,
                "empty request body",
            ));
        }

        let value: T = serde_json::from_slice(body).map_err(|e| {
            ResolutionError::deserialization_failed(RequestSource::Body, e.to_string())
        })?;
        Ok(HandlerValue::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::{MethodId, TypeKey};
    use http::StatusCode;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Order {
        sku: String,
        quantity: u32,
    }

    fn order_parameter() -> MethodParameter {
        MethodParameter::new(MethodId::next(), "place(Order)", 0, TypeKey::of::<Order>())
    }

    fn resolve(
        resolver: &RequestBodyResolver<Order>,
        content_type: Option<&str>,
        body: &'static str,
    ) -> Result<HandlerValue, ResolutionError> {
        let mut builder = NativeRequest::builder().body(bytes::Bytes::from_static(body.as_bytes()));
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        resolver.resolve_argument(&order_parameter(), &mut ModelContainer::new(), &builder.build(), None)
    }

    #[test]
    fn test_supports_only_target_type() {
        let resolver = RequestBodyResolver::<Order>::new();
        assert!(resolver.supports_parameter(&order_parameter()));
        assert!(!resolver.supports_parameter(&MethodParameter::new(
            MethodId::next(),
            "f",
            0,
            TypeKey::of::<String>()
        )));
    }

    #[test]
    fn test_valid_body() {
        let resolver = RequestBodyResolver::<Order>::new();
        let value = resolve(
            &resolver,
            Some("application/json; charset=utf-8"),
            r#"{"sku":"A-1","quantity":2}"#,
        )
        .unwrap();
        assert_eq!(
            value.downcast_ref::<Order>(),
            Some(&Order {
                sku: "A-1".into(),
                quantity: 2
            })
        );
    }

    #[test]
    fn test_vendor_json_media_type() {
        let resolver = RequestBodyResolver::<Order>::new();
        let value = resolve(
            &resolver,
            Some("application/vnd.orders+json"),
            r#"{"sku":"B","quantity":1}"#,
        );
        assert!(value.is_ok());
    }

    #[test]
    fn test_wrong_or_missing_content_type() {
        let resolver = RequestBodyResolver::<Order>::new();

        let err = resolve(&resolver, Some("text/plain"), "{}").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(err.to_string().contains("text/plain"));

        let err = resolve(&resolver, None, "{}").unwrap_err();
        assert_eq!(err.request_source(), RequestSource::ContentType);
    }

    #[test]
    fn test_empty_body() {
        let resolver = RequestBodyResolver::<Order>::new();
        let err = resolve(&resolver, Some("application/json"), "").unwrap_err();
        assert_eq!(err.error_code(), "DESERIALIZATION_FAILED");
        assert!(err.to_string().contains("empty request body"));
    }

    #[test]
    fn test_malformed_body() {
        let resolver = RequestBodyResolver::<Order>::new();
        let err = resolve(&resolver, Some("application/json"), r#"{"sku":1}"#).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.request_source(), RequestSource::Body);
    }

    #[test]
    fn test_size_limit() {
        let resolver = RequestBodyResolver::<Order>::with_limit(8);
        assert_eq!(resolver.max_size(), 8);
        let err = resolve(&resolver, Some("application/json"), r#"{"sku":"A","quantity":1}"#)
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
