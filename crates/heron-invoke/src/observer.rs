//! Invocation observer hooks.
//!
//! The invocable handler reports each step of an invocation to an
//! [`InvocationObserver`]. [`TracingObserver`] turns them into `tracing`
//! events; custom observers can collect metrics or audit trails.

use crate::{HandlerMethod, InvocationError};
use heron_core::{HandlerValue, MethodParameter};

/// Receives callbacks around argument resolution and the handler call.
///
/// Every hook has an empty default. Observers run on the invoking task and
/// should not block.
pub trait InvocationObserver: Send + Sync {
    /// A parameter is about to be resolved.
    fn before_resolve(&self, _method: &HandlerMethod, _parameter: &MethodParameter) {}

    /// A parameter was resolved.
    fn after_resolve(
        &self,
        _method: &HandlerMethod,
        _parameter: &MethodParameter,
        _value: &HandlerValue,
    ) {
    }

    /// All arguments are resolved and the handler is about to run.
    fn before_invoke(&self, _method: &HandlerMethod, _args: &[HandlerValue]) {}

    /// The handler returned successfully.
    fn after_invoke(&self, _method: &HandlerMethod, _value: &HandlerValue) {}

    /// The invocation failed at any stage.
    fn on_failure(&self, _method: &HandlerMethod, _error: &InvocationError) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl InvocationObserver for NoopObserver {}

/// Observer emitting `tracing` events.
///
/// Argument lists and return values are logged at trace level when
/// `trace_arguments` is on. Failures are logged at debug level, except
/// receiver mismatches and panics, which are warnings.
#[derive(Debug, Clone, Copy)]
pub struct TracingObserver {
    trace_arguments: bool,
}

impl TracingObserver {
    /// Creates an observer.
    #[must_use]
    pub const fn new(trace_arguments: bool) -> Self {
        Self { trace_arguments }
    }

    /// Returns `true` if argument values are logged.
    #[must_use]
    pub const fn traces_arguments(&self) -> bool {
        self.trace_arguments
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new(true)
    }
}

impl InvocationObserver for TracingObserver {
    fn before_invoke(&self, method: &HandlerMethod, args: &[HandlerValue]) {
        if self.trace_arguments {
            tracing::trace!(
                handler = method.receiver_type(),
                method = method.signature(),
                arguments = ?args,
                "invoking handler method"
            );
        }
    }

    fn after_invoke(&self, method: &HandlerMethod, value: &HandlerValue) {
        if self.trace_arguments {
            tracing::trace!(
                method = method.signature(),
                value = ?value,
                "handler method returned"
            );
        }
    }

    fn on_failure(&self, method: &HandlerMethod, error: &InvocationError) {
        match error {
            InvocationError::Resolution {
                index, type_name, ..
            }
            | InvocationError::ArgumentResolution {
                index, type_name, ..
            } => {
                tracing::debug!(
                    method = method.signature(),
                    param_index = index,
                    param_type = type_name,
                    error = %error,
                    "failed to resolve argument"
                );
            }
            InvocationError::ReceiverMismatch { .. } | InvocationError::Invocation { .. } => {
                tracing::warn!(
                    method = method.signature(),
                    error = %error,
                    "handler invocation failed"
                );
            }
            InvocationError::Target(failure) => {
                tracing::debug!(
                    method = method.signature(),
                    error = %failure,
                    "handler method returned an error"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::Arc;

    #[test]
    fn test_tracing_observer_defaults() {
        assert!(TracingObserver::default().traces_arguments());
        assert!(!TracingObserver::new(false).traces_arguments());
    }

    #[test]
    fn test_hooks_do_not_require_subscriber() {
        let method = HandlerMethod::new(Arc::new(()), "noop", |_: Arc<()>| async {
            Ok::<_, Infallible>(())
        });
        let observer = TracingObserver::default();
        let error = InvocationError::ArgumentResolution {
            index: 0,
            type_name: "u8",
            signature: method.signature().to_string(),
        };

        observer.before_invoke(&method, &[HandlerValue::new(1_u8)]);
        observer.after_invoke(&method, &HandlerValue::unit());
        observer.on_failure(&method, &error);
        NoopObserver.on_failure(&method, &error);
    }
}
