//! Request abstraction handed to argument resolvers.
//!
//! [`NativeRequest`] is an immutable snapshot of an HTTP request: method, URI,
//! headers, body, and the path variables captured by routing.

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use uuid::Uuid;

/// Maximum number of path variables stored inline.
const INLINE_VARIABLES: usize = 4;

/// A unique identifier for each request, using UUID v7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new time-ordered request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Path variables captured while matching the request URL.
///
/// Stored as ordered (name, value) pairs, inline for the common case of a
/// handful of variables.
///
/// # Example
///
/// ```rust
/// use heron_core::PathVariables;
///
/// let mut vars = PathVariables::new();
/// vars.push("userId", "123");
///
/// assert_eq!(vars.get("userId"), Some("123"));
/// assert_eq!(vars.get("unknown"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathVariables {
    inner: SmallVec<[(String, String); INLINE_VARIABLES]>,
}

impl PathVariables {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value of a variable by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if there are no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates over (name, value) pairs in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// An HTTP request as seen by argument resolvers.
///
/// # Example
///
/// ```rust
/// use heron_core::NativeRequest;
/// use http::Method;
///
/// let request = NativeRequest::builder()
///     .method(Method::GET)
///     .uri("/users/7?verbose=true&tag=a&tag=b")
///     .path_variable("id", "7")
///     .header("accept", "application/json")
///     .build();
///
/// assert_eq!(request.path(), "/users/7");
/// assert_eq!(request.query_param("verbose").as_deref(), Some("true"));
/// assert_eq!(request.query_params("tag"), vec!["a", "b"]);
/// assert_eq!(request.path_variables().get("id"), Some("7"));
/// assert_eq!(request.header("accept"), Some("application/json"));
/// ```
#[derive(Debug, Clone)]
pub struct NativeRequest {
    request_id: RequestId,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_variables: PathVariables,
}

impl NativeRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        path_variables: PathVariables,
    ) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            uri,
            headers,
            body,
            path_variables,
        }
    }

    /// Returns a builder.
    #[must_use]
    pub fn builder() -> NativeRequestBuilder {
        NativeRequestBuilder::new()
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the raw query string if present.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the first value of a query parameter, percent-decoded.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Returns every value of a query parameter, in order of appearance.
    #[must_use]
    pub fn query_params(&self, name: &str) -> Vec<String> {
        self.query_pairs()
            .into_iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v)
            .collect()
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        self.query_string()
            .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
            .unwrap_or_default()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Returns the request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the captured path variables.
    #[must_use]
    pub fn path_variables(&self) -> &PathVariables {
        &self.path_variables
    }

    /// Returns the request with the given path variables.
    #[must_use]
    pub fn with_path_variables(mut self, path_variables: PathVariables) -> Self {
        self.path_variables = path_variables;
        self
    }
}

/// Builder for [`NativeRequest`].
#[derive(Debug, Default)]
pub struct NativeRequestBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
    path_variables: PathVariables,
}

impl NativeRequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method. Defaults to `GET`.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI. Unparseable URIs are ignored and `/` is used.
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = uri.parse().ok();
        self
    }

    /// Adds a header. Invalid names or values are ignored.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(name.as_bytes()),
            http::HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a path variable.
    #[must_use]
    pub fn path_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_variables.push(name, value);
        self
    }

    /// Builds the request.
    #[must_use]
    pub fn build(self) -> NativeRequest {
        NativeRequest::new(
            self.method.unwrap_or(Method::GET),
            self.uri.unwrap_or_else(|| Uri::from_static("/")),
            self.headers,
            self.body,
            self.path_variables,
        )
    }
}
