//! Argument resolution errors.
//!
//! A [`ResolutionError`] is raised by a resolver when the request does not
//! carry usable data for a parameter: a missing query parameter, a header
//! that does not convert to the declared type, a malformed JSON body.

use http::StatusCode;
use std::fmt;

/// Where a resolver was reading from when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestSource {
    /// Path variables (e.g., `/users/{id}`)
    Path,
    /// Query string parameters
    Query,
    /// Request body
    Body,
    /// HTTP headers
    Header,
    /// Content-Type header specifically
    ContentType,
    /// The shared per-request model
    Model,
    /// Anything else (binder setup, resolver chain configuration)
    Other,
}

impl fmt::Display for RequestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Body => write!(f, "body"),
            Self::Header => write!(f, "header"),
            Self::ContentType => write!(f, "content-type"),
            Self::Model => write!(f, "model"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Error produced by an argument resolver.
///
/// # Example
///
/// ```rust
/// use heron_core::{RequestSource, ResolutionError};
/// use http::StatusCode;
///
/// let err = ResolutionError::missing(RequestSource::Query, "page");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.request_source(), RequestSource::Query);
/// assert!(err.to_string().contains("page"));
/// ```
#[derive(Debug)]
pub struct ResolutionError {
    request_source: RequestSource,
    kind: ResolutionErrorKind,
    field: Option<String>,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolutionErrorKind {
    Missing,
    InvalidType,
    BindingFailed,
    DeserializationFailed,
    PayloadTooLarge,
    UnsupportedMediaType,
    Unsupported,
    Custom,
}

impl ResolutionError {
    /// A required value is absent from the request.
    #[must_use]
    pub fn missing(source: RequestSource, field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            request_source: source,
            kind: ResolutionErrorKind::Missing,
            message: format!("missing required {source} parameter: {field}"),
            field: Some(field),
        }
    }

    /// A value is present but does not convert to the declared type.
    #[must_use]
    pub fn invalid_type(
        source: RequestSource,
        field: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let details = details.into();
        Self {
            request_source: source,
            kind: ResolutionErrorKind::InvalidType,
            message: format!("invalid {source} parameter '{field}': {details}"),
            field: Some(field),
        }
    }

    /// Data binding rejected a value.
    #[must_use]
    pub fn binding_failed(
        source: RequestSource,
        field: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let details = details.into();
        Self {
            request_source: source,
            kind: ResolutionErrorKind::BindingFailed,
            message: format!("binding failed for {source} parameter '{field}': {details}"),
            field: Some(field),
        }
    }

    /// The body could not be deserialised.
    #[must_use]
    pub fn deserialization_failed(source: RequestSource, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            request_source: source,
            kind: ResolutionErrorKind::DeserializationFailed,
            message: format!("failed to deserialize {source}: {error}"),
            field: None,
        }
    }

    /// The body exceeds the resolver's size limit.
    #[must_use]
    pub fn payload_too_large(max_size: usize, actual_size: usize) -> Self {
        Self {
            request_source: RequestSource::Body,
            kind: ResolutionErrorKind::PayloadTooLarge,
            message: format!("payload too large: max {max_size} bytes, got {actual_size} bytes"),
            field: None,
        }
    }

    /// The body has a content type the resolver cannot read.
    #[must_use]
    pub fn unsupported_media_type(expected: &str, actual: Option<&str>) -> Self {
        let actual_str = actual.unwrap_or("none");
        Self {
            request_source: RequestSource::ContentType,
            kind: ResolutionErrorKind::UnsupportedMediaType,
            message: format!(
                "unsupported content type: expected '{expected}', got '{actual_str}'"
            ),
            field: None,
        }
    }

    /// No resolver in a chain supports the parameter.
    ///
    /// Callers should check support before resolving; this signals that the
    /// check was skipped.
    #[must_use]
    pub fn unsupported(type_name: &str, index: usize) -> Self {
        Self {
            request_source: RequestSource::Other,
            kind: ResolutionErrorKind::Unsupported,
            message: format!(
                "unsupported parameter type [{type_name}] at index {index}: \
                 supports_parameter should be called first"
            ),
            field: None,
        }
    }

    /// Any other failure.
    #[must_use]
    pub fn custom(
        source: RequestSource,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            request_source: source,
            kind: ResolutionErrorKind::Custom,
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Returns the request source.
    #[must_use]
    pub fn request_source(&self) -> RequestSource {
        self.request_source
    }

    /// Returns the field name if applicable.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns `true` for the "no resolver supports this parameter" case.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        self.kind == ResolutionErrorKind::Unsupported
    }

    /// Returns the HTTP status code a dispatcher should answer with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ResolutionErrorKind::Missing
            | ResolutionErrorKind::InvalidType
            | ResolutionErrorKind::DeserializationFailed => StatusCode::BAD_REQUEST,
            ResolutionErrorKind::BindingFailed => StatusCode::UNPROCESSABLE_ENTITY,
            ResolutionErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ResolutionErrorKind::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ResolutionErrorKind::Unsupported | ResolutionErrorKind::Custom => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ResolutionErrorKind::Missing => "MISSING_PARAMETER",
            ResolutionErrorKind::InvalidType => "INVALID_PARAMETER",
            ResolutionErrorKind::BindingFailed => "BINDING_FAILED",
            ResolutionErrorKind::DeserializationFailed => "DESERIALIZATION_FAILED",
            ResolutionErrorKind::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ResolutionErrorKind::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            ResolutionErrorKind::Unsupported => "UNSUPPORTED_PARAMETER",
            ResolutionErrorKind::Custom => "RESOLUTION_FAILED",
        }
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ResolutionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_error() {
        let err = ResolutionError::missing(RequestSource::Path, "user_id");

        assert_eq!(err.request_source(), RequestSource::Path);
        assert_eq!(err.field(), Some("user_id"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "MISSING_PARAMETER");
        assert!(err.to_string().contains("missing required path parameter: user_id"));
    }

    #[test]
    fn test_invalid_type_error() {
        let err = ResolutionError::invalid_type(RequestSource::Query, "limit", "expected integer");

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
        assert!(err.to_string().contains("limit"));
        assert!(err.to_string().contains("expected integer"));
    }

    #[test]
    fn test_binding_failed_error() {
        let err = ResolutionError::binding_failed(RequestSource::Body, "email", "blank");
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_code(), "BINDING_FAILED");
    }

    #[test]
    fn test_payload_too_large_error() {
        let err = ResolutionError::payload_too_large(1024, 2048);
        assert_eq!(err.request_source(), RequestSource::Body);
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(err.to_string().contains("2048"));
    }

    #[test]
    fn test_unsupported_media_type_error() {
        let err = ResolutionError::unsupported_media_type("application/json", Some("text/plain"));

        assert_eq!(err.request_source(), RequestSource::ContentType);
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(err.to_string().contains("text/plain"));

        let none = ResolutionError::unsupported_media_type("application/json", None);
        assert!(none.to_string().contains("'none'"));
    }

    #[test]
    fn test_unsupported_parameter() {
        let err = ResolutionError::unsupported("u64", 3);
        assert!(err.is_unsupported());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("index 3"));
    }

    #[test]
    fn test_request_source_display() {
        assert_eq!(RequestSource::Path.to_string(), "path");
        assert_eq!(RequestSource::Query.to_string(), "query");
        assert_eq!(RequestSource::Model.to_string(), "model");
        assert_eq!(RequestSource::ContentType.to_string(), "content-type");
    }
}
