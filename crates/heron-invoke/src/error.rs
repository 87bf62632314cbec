//! Invocation errors.
//!
//! [`InvocationError`] covers every way an invocation can fail, from
//! argument resolution to the handler's own error. The handler's error is
//! kept as-is inside a [`HandlerFailure`] so callers can match on its
//! concrete type.

use crate::HandlerMethod;
use heron_core::{HandlerValue, ResolutionError};
use http::StatusCode;
use std::error::Error as StdError;
use std::fmt::{self, Write as _};
use std::sync::Arc;
use thiserror::Error;

/// Boxed error type handlers may return.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// The error a handler returned, shared and type-erased.
///
/// Cloning shares the same error object; [`ptr_eq`](Self::ptr_eq) tells
/// whether two failures are the same object.
///
/// # Example
///
/// ```rust
/// use heron_invoke::HandlerFailure;
/// use std::io;
///
/// let failure = HandlerFailure::new(io::Error::new(io::ErrorKind::NotFound, "gone"));
/// assert!(failure.is::<io::Error>());
/// assert_eq!(failure.downcast_ref::<io::Error>().map(io::Error::kind), Some(io::ErrorKind::NotFound));
/// ```
#[derive(Clone)]
pub struct HandlerFailure {
    inner: Arc<dyn StdError + Send + Sync>,
}

impl HandlerFailure {
    /// Wraps an error.
    pub fn new<E: StdError + Send + Sync + 'static>(error: E) -> Self {
        Self {
            inner: Arc::new(error),
        }
    }

    /// Wraps an already boxed error without re-boxing it.
    #[must_use]
    pub fn from_boxed(error: BoxError) -> Self {
        Self {
            inner: Arc::from(error),
        }
    }

    /// Returns `true` if the wrapped error is an `E`.
    #[must_use]
    pub fn is<E: StdError + 'static>(&self) -> bool {
        self.inner.is::<E>()
    }

    /// Borrows the wrapped error as an `E`.
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    /// Returns the wrapped error.
    #[must_use]
    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.inner
    }

    /// Returns `true` if both failures share the same error object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner, f)
    }
}

impl StdError for HandlerFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source()
    }
}

/// Error returned by [`InvocableHandlerMethod::invoke_for_request`](crate::InvocableHandlerMethod::invoke_for_request).
#[derive(Debug, Error)]
pub enum InvocationError {
    /// No provided argument matched and no resolver supports the parameter.
    #[error(
        "could not resolve parameter [{index}] in {signature}: \
         no suitable resolver for argument of type [{type_name}]"
    )]
    ArgumentResolution {
        /// Parameter position.
        index: usize,
        /// Declared parameter type.
        type_name: &'static str,
        /// Signature of the handler method.
        signature: String,
    },

    /// A resolver supported the parameter but failed to produce a value.
    #[error("could not resolve parameter [{index}] of type [{type_name}]: {source}")]
    Resolution {
        /// Parameter position.
        index: usize,
        /// Declared parameter type.
        type_name: &'static str,
        /// The resolver's error, unchanged.
        #[source]
        source: ResolutionError,
    },

    /// The receiver is not an instance of the handler method's declaring type.
    #[error("{details}")]
    ReceiverMismatch {
        /// Declaring type of the handler method.
        expected: &'static str,
        /// Actual receiver type.
        actual: &'static str,
        /// Full message including the argument dump.
        details: String,
    },

    /// The call itself failed: the arguments did not fit the callable, or
    /// the handler panicked.
    #[error("{details}")]
    Invocation {
        /// Short description of the failure.
        message: String,
        /// Full message including the argument dump.
        details: String,
    },

    /// The handler returned an error.
    #[error(transparent)]
    Target(HandlerFailure),
}

impl InvocationError {
    pub(crate) fn receiver_mismatch(method: &HandlerMethod, args: &[HandlerValue]) -> Self {
        let expected = method.declaring_type().name();
        let actual = method.receiver_type();
        let message = format!(
            "The mapped handler method type '{expected}' does not match the actual receiver \
             type '{actual}'. Wrapped or proxied receivers must expose the concrete handler type."
        );
        Self::ReceiverMismatch {
            expected,
            actual,
            details: format_argument_details(&message, method, args),
        }
    }

    pub(crate) fn invocation(
        message: impl Into<String>,
        method: &HandlerMethod,
        args: &[HandlerValue],
    ) -> Self {
        let message = message.into();
        Self::Invocation {
            details: format_argument_details(&message, method, args),
            message,
        }
    }

    /// Returns the handler's own error, if that is what failed.
    #[must_use]
    pub fn failure(&self) -> Option<&HandlerFailure> {
        match self {
            Self::Target(failure) => Some(failure),
            _ => None,
        }
    }

    /// Returns the resolver error, if argument resolution failed.
    #[must_use]
    pub fn resolution_error(&self) -> Option<&ResolutionError> {
        match self {
            Self::Resolution { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Returns the HTTP status code a dispatcher should answer with.
    ///
    /// Resolver errors keep their own status; everything else is a server
    /// error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Resolution { source, .. } => source.status_code(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Renders a failure message followed by the handler details and one line
/// per resolved argument.
pub(crate) fn format_argument_details(
    message: &str,
    method: &HandlerMethod,
    args: &[HandlerValue],
) -> String {
    let mut out = String::new();
    if !message.is_empty() {
        let _ = writeln!(out, "{message}");
    }
    let _ = writeln!(out, "HandlerMethod details:");
    let _ = writeln!(out, "Controller [{}]", method.receiver_type());
    let _ = writeln!(out, "Method [{}]", method.signature());
    let _ = write!(out, "Resolved arguments:");
    for (index, arg) in args.iter().enumerate() {
        let _ = write!(
            out,
            "\n[{index}] [type={}] [value={}]",
            arg.type_name(),
            arg.repr()
        );
    }
    out
}
