//! Caller-supplied argument values.

use crate::HandlerFailure;
use heron_core::{HandlerValue, MethodParameter, SessionStatus, TypeKey, WebDataBinder};
use std::any::Any;
use std::fmt;

/// A value handed to an invocation directly instead of being resolved.
///
/// Provided arguments are matched to parameters by exact type, first match
/// wins, and are not consumed: one value can fill several parameters.
///
/// ```rust
/// use heron_core::{MethodId, MethodParameter, TypeKey};
/// use heron_invoke::ProvidedArg;
///
/// let provided = [ProvidedArg::value(String::from("hello")), ProvidedArg::value(7_u8)];
/// let parameter = MethodParameter::new(MethodId::next(), "f(u8)", 0, TypeKey::of::<u8>());
///
/// let value = ProvidedArg::find(&provided, &parameter).unwrap();
/// assert_eq!(value.downcast_ref::<u8>(), Some(&7));
/// ```
#[derive(Debug, Clone)]
pub enum ProvidedArg {
    /// A data binder, for init-binder style handlers.
    Binder(WebDataBinder),
    /// The session status of the current request.
    SessionStatus(SessionStatus),
    /// A failure being handled, for error-handler methods.
    Failure(HandlerFailure),
    /// Any other value.
    Value(HandlerValue),
}

impl ProvidedArg {
    /// Wraps an arbitrary value.
    pub fn value<T: Any + Send + Sync + fmt::Debug>(value: T) -> Self {
        Self::Value(HandlerValue::new(value))
    }

    /// Returns the type a parameter must declare to receive this value.
    #[must_use]
    pub fn type_key(&self) -> TypeKey {
        match self {
            Self::Binder(_) => TypeKey::of::<WebDataBinder>(),
            Self::SessionStatus(_) => TypeKey::of::<SessionStatus>(),
            Self::Failure(_) => TypeKey::of::<HandlerFailure>(),
            Self::Value(value) => value.type_key(),
        }
    }

    /// Returns `true` if a parameter of type `parameter` accepts this value.
    #[must_use]
    pub fn matches(&self, parameter: &MethodParameter) -> bool {
        self.type_key() == parameter.type_key()
    }

    /// Returns the value as a handler argument.
    #[must_use]
    pub fn to_value(&self) -> HandlerValue {
        match self {
            Self::Binder(binder) => HandlerValue::new(binder.clone()),
            Self::SessionStatus(status) => HandlerValue::new(status.clone()),
            Self::Failure(failure) => HandlerValue::new(failure.clone()),
            Self::Value(value) => value.clone(),
        }
    }

    /// Returns the first provided value matching `parameter`, in order.
    #[must_use]
    pub fn find(provided: &[Self], parameter: &MethodParameter) -> Option<HandlerValue> {
        provided
            .iter()
            .find(|arg| arg.matches(parameter))
            .map(Self::to_value)
    }
}

impl From<HandlerValue> for ProvidedArg {
    fn from(value: HandlerValue) -> Self {
        Self::Value(value)
    }
}

impl From<WebDataBinder> for ProvidedArg {
    fn from(binder: WebDataBinder) -> Self {
        Self::Binder(binder)
    }
}

impl From<SessionStatus> for ProvidedArg {
    fn from(status: SessionStatus) -> Self {
        Self::SessionStatus(status)
    }
}

impl From<HandlerFailure> for ProvidedArg {
    fn from(failure: HandlerFailure) -> Self {
        Self::Failure(failure)
    }
}
