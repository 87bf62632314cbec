//! Dispatch errors.

use heron_invoke::InvocationError;
use http::StatusCode;
use thiserror::Error;

/// Error returned by [`Dispatcher::dispatch`](crate::Dispatcher::dispatch).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No URL mapping, pattern, root or default handler matches the path.
    #[error("no handler found for path '{path}'")]
    NoHandlerFound {
        /// The request path.
        path: String,
    },

    /// The path maps to a name whose registered object is not a
    /// [`HandlerMethod`](heron_invoke::HandlerMethod).
    #[error("handler '{name}' is not an invocable handler method")]
    HandlerNotInvocable {
        /// The mapped name.
        name: String,
    },

    /// Argument resolution or the handler itself failed.
    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

impl DispatchError {
    /// Returns the HTTP status code to answer with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NoHandlerFound { .. } => StatusCode::NOT_FOUND,
            Self::HandlerNotInvocable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Invocation(err) => err.status_code(),
        }
    }

    /// Returns the invocation error, if that is what failed.
    #[must_use]
    pub fn invocation_error(&self) -> Option<&InvocationError> {
        match self {
            Self::Invocation(err) => Some(err),
            _ => None,
        }
    }
}
