//! The invocable handler.

use crate::error::InvocationError;
use crate::handler::{CallError, HandlerMethod};
use crate::observer::{InvocationObserver, TracingObserver};
use crate::ProvidedArg;
use futures_util::FutureExt;
use heron_core::{DataBinderFactory, HandlerValue, ModelContainer, NativeRequest};
use heron_resolve::{ArgumentResolver, ResolverChain};
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// A [`HandlerMethod`] that resolves its own arguments before calling the
/// handler.
///
/// Arguments are resolved in declaration order: a matching
/// [`ProvidedArg`] first, the resolver chain otherwise. The first failure
/// aborts the invocation. The handler's own error is returned unchanged as
/// [`InvocationError::Target`].
///
/// # Example
///
/// ```rust
/// use heron_core::{ModelContainer, NativeRequest};
/// use heron_invoke::{HandlerMethod, InvocableHandlerMethod, ProvidedArg};
/// use heron_resolve::{FnResolver, ResolverChain};
/// use std::convert::Infallible;
/// use std::sync::Arc;
///
/// struct Echo;
///
/// let method = HandlerMethod::new(Arc::new(Echo), "echo", |_: Arc<Echo>, a: String, b: i64| async move {
///     Ok::<_, Infallible>(format!("{a}-{b}"))
/// });
///
/// let mut invocable = InvocableHandlerMethod::new(method);
/// invocable.set_resolvers(Arc::new(ResolverChain::new().with(FnResolver::constant(42_i64))));
///
/// let request = NativeRequest::builder().build();
/// let mut container = ModelContainer::new();
/// let provided = [ProvidedArg::value(String::from("hello"))];
///
/// let value = tokio_test::block_on(invocable.invoke_for_request(&request, &mut container, &provided))
///     .unwrap();
/// assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("hello-42"));
/// ```
#[derive(Clone)]
pub struct InvocableHandlerMethod {
    method: HandlerMethod,
    resolvers: Arc<ResolverChain>,
    binder_factory: Option<Arc<dyn DataBinderFactory>>,
    observer: Arc<dyn InvocationObserver>,
    catch_panics: bool,
}

impl InvocableHandlerMethod {
    /// Wraps a handler method with an empty resolver chain, no binder
    /// factory and a [`TracingObserver`].
    #[must_use]
    pub fn new(method: HandlerMethod) -> Self {
        Self {
            method,
            resolvers: Arc::new(ResolverChain::new()),
            binder_factory: None,
            observer: Arc::new(TracingObserver::default()),
            catch_panics: true,
        }
    }

    /// Sets the resolver chain.
    pub fn set_resolvers(&mut self, resolvers: Arc<ResolverChain>) {
        self.resolvers = resolvers;
    }

    /// Sets the factory handed to resolvers that convert values.
    pub fn set_binder_factory(&mut self, factory: Arc<dyn DataBinderFactory>) {
        self.binder_factory = Some(factory);
    }

    /// Names the handler's parameters by position.
    pub fn set_parameter_names<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        self.method = self.method.with_parameter_names(names);
    }

    /// Sets the observer notified around resolution and invocation.
    pub fn set_observer(&mut self, observer: Arc<dyn InvocationObserver>) {
        self.observer = observer;
    }

    /// Controls whether handler panics are caught and reported as
    /// [`InvocationError::Invocation`]. On by default.
    ///
    /// While on, resolved arguments stay shared with the error report, so
    /// owned arguments are cloned into the handler.
    pub fn set_catch_panics(&mut self, catch_panics: bool) {
        self.catch_panics = catch_panics;
    }

    /// Returns the wrapped handler method.
    #[must_use]
    pub fn method(&self) -> &HandlerMethod {
        &self.method
    }

    /// Returns the resolver chain.
    #[must_use]
    pub fn resolvers(&self) -> &Arc<ResolverChain> {
        &self.resolvers
    }

    /// Resolves the arguments, calls the handler and returns its value.
    ///
    /// `container` receives whatever side effects resolvers record.
    ///
    /// # Errors
    ///
    /// - [`InvocationError::ArgumentResolution`] if a parameter has neither a
    ///   provided value nor a supporting resolver
    /// - [`InvocationError::Resolution`] if a resolver fails
    /// - [`InvocationError::ReceiverMismatch`] if the receiver is not of the
    ///   method's declaring type; the handler does not run
    /// - [`InvocationError::Invocation`] if the arguments do not fit the
    ///   callable or the handler panics
    /// - [`InvocationError::Target`] with the handler's own error
    pub async fn invoke_for_request(
        &self,
        request: &NativeRequest,
        container: &mut ModelContainer,
        provided: &[ProvidedArg],
    ) -> Result<HandlerValue, InvocationError> {
        let result = match self.method_argument_values(request, container, provided) {
            Ok(args) => {
                self.observer.before_invoke(&self.method, &args);
                self.do_invoke(args).await
            }
            Err(err) => Err(err),
        };
        match &result {
            Ok(value) => self.observer.after_invoke(&self.method, value),
            Err(err) => self.observer.on_failure(&self.method, err),
        }
        result
    }

    /// Resolves every parameter of the handler method.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::ArgumentResolution`] or
    /// [`InvocationError::Resolution`] for the first parameter that cannot
    /// be resolved.
    pub fn method_argument_values(
        &self,
        request: &NativeRequest,
        container: &mut ModelContainer,
        provided: &[ProvidedArg],
    ) -> Result<Vec<HandlerValue>, InvocationError> {
        let parameters = self.method.parameters();
        let mut args = Vec::with_capacity(parameters.len());

        for parameter in parameters {
            self.observer.before_resolve(&self.method, parameter);

            let value = match ProvidedArg::find(provided, parameter) {
                Some(value) => value,
                None => {
                    if !self.resolvers.supports_parameter(parameter) {
                        return Err(InvocationError::ArgumentResolution {
                            index: parameter.index(),
                            type_name: parameter.type_name(),
                            signature: self.method.signature().to_string(),
                        });
                    }
                    self.resolvers
                        .resolve_argument(
                            parameter,
                            container,
                            request,
                            self.binder_factory.as_deref(),
                        )
                        .map_err(|source| InvocationError::Resolution {
                            index: parameter.index(),
                            type_name: parameter.type_name(),
                            source,
                        })?
                }
            };

            self.observer.after_resolve(&self.method, parameter, &value);
            args.push(value);
        }

        Ok(args)
    }

    async fn do_invoke(&self, args: Vec<HandlerValue>) -> Result<HandlerValue, InvocationError> {
        if !self.catch_panics {
            let future = self.start(args)?;
            return future.await.map_err(InvocationError::Target);
        }

        let report = args.clone();
        let future = match std::panic::catch_unwind(AssertUnwindSafe(|| self.start(args))) {
            Ok(started) => started?,
            Err(payload) => return Err(self.panic_error(payload.as_ref(), &report)),
        };
        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(outcome) => outcome.map_err(InvocationError::Target),
            Err(payload) => Err(self.panic_error(payload.as_ref(), &report)),
        }
    }

    fn start(&self, args: Vec<HandlerValue>) -> Result<crate::HandlerFuture, InvocationError> {
        self.method.call(args).map_err(|err| match err {
            CallError::ReceiverMismatch(args) => {
                InvocationError::receiver_mismatch(&self.method, &args)
            }
            CallError::Arguments(mismatch, args) => {
                InvocationError::invocation(mismatch.to_string(), &self.method, &args)
            }
        })
    }

    fn panic_error(&self, payload: &(dyn Any + Send), args: &[HandlerValue]) -> InvocationError {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        InvocationError::invocation(
            format!("Invocation failure: handler panicked: {reason}"),
            &self.method,
            args,
        )
    }
}

impl fmt::Debug for InvocableHandlerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocableHandlerMethod")
            .field("method", &self.method)
            .field("resolvers", &self.resolvers.len())
            .field("binder_factory", &self.binder_factory.is_some())
            .field("catch_panics", &self.catch_panics)
            .finish_non_exhaustive()
    }
}

impl From<HandlerMethod> for InvocableHandlerMethod {
    fn from(method: HandlerMethod) -> Self {
        Self::new(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HandlerFailure;
    use heron_core::{DefaultBinderFactory, MethodParameter, RequestSource, ResolutionError};
    use heron_resolve::{FnResolver, RequestParamResolver};
    use parking_lot::Mutex;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Echo;

    fn echo() -> HandlerMethod {
        HandlerMethod::new(
            Arc::new(Echo),
            "echo",
            |_: Arc<Echo>, a: String, b: i64| async move { Ok::<_, Infallible>(format!("{a}:{b}")) },
        )
    }

    fn chain(resolvers: ResolverChain) -> Arc<ResolverChain> {
        Arc::new(resolvers)
    }

    async fn invoke(
        invocable: &InvocableHandlerMethod,
        provided: &[ProvidedArg],
    ) -> Result<HandlerValue, InvocationError> {
        let request = NativeRequest::builder().uri("/echo").build();
        invocable
            .invoke_for_request(&request, &mut ModelContainer::new(), provided)
            .await
    }

    #[tokio::test]
    async fn test_provided_and_resolved_arguments() {
        let mut invocable = InvocableHandlerMethod::new(echo());
        invocable.set_resolvers(chain(ResolverChain::new().with(FnResolver::constant(42_i64))));

        let value = invoke(&invocable, &[ProvidedArg::value(String::from("hello"))])
            .await
            .unwrap();
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("hello:42"));
    }

    #[tokio::test]
    async fn test_zero_parameters_need_no_resolvers() {
        let method = HandlerMethod::new(Arc::new(Echo), "ping", |_: Arc<Echo>| async {
            Ok::<_, Infallible>(1_u8)
        });
        let value = invoke(&InvocableHandlerMethod::new(method), &[]).await.unwrap();
        assert_eq!(value.downcast_ref::<u8>(), Some(&1));
    }

    #[tokio::test]
    async fn test_unresolvable_parameter_names_index() {
        let invocable = InvocableHandlerMethod::new(echo());
        let err = invoke(&invocable, &[ProvidedArg::value(String::from("x"))])
            .await
            .unwrap_err();

        match err {
            InvocationError::ArgumentResolution {
                index,
                type_name,
                signature,
            } => {
                assert_eq!(index, 1);
                assert_eq!(type_name, "i64");
                assert!(signature.contains("echo"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_nothing_to_resolve_with_fails_at_first_parameter() {
        let invocable = InvocableHandlerMethod::new(echo());
        assert!(invocable.resolvers().is_empty());

        let err = invoke(&invocable, &[]).await.unwrap_err();
        match err {
            InvocationError::ArgumentResolution { index, type_name, .. } => {
                assert_eq!(index, 0);
                assert!(type_name.ends_with("String"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_provided_argument_short_circuits_chain() {
        let checks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&checks);
        let mut invocable = InvocableHandlerMethod::new(echo());
        invocable.set_resolvers(chain(ResolverChain::new().with(FnResolver::new(
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            },
            |_, _, _| Ok(HandlerValue::new(0_i64)),
        ))));

        let provided = [
            ProvidedArg::value(String::from("p")),
            ProvidedArg::value(5_i64),
        ];
        let value = invoke(&invocable, &provided).await.unwrap();
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("p:5"));
        assert_eq!(checks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolver_failure_keeps_source() {
        let mut invocable = InvocableHandlerMethod::new(echo());
        invocable.set_resolvers(chain(ResolverChain::new().with(FnResolver::for_type::<i64, _>(
            |_, _, _| Err(ResolutionError::missing(RequestSource::Query, "b")),
        ))));

        let err = invoke(&invocable, &[ProvidedArg::value(String::from("a"))])
            .await
            .unwrap_err();
        let source = err.resolution_error().unwrap();
        assert_eq!(source.field(), Some("b"));
        assert_eq!(source.request_source(), RequestSource::Query);
        assert!(matches!(err, InvocationError::Resolution { index: 1, .. }));
    }

    #[tokio::test]
    async fn test_receiver_mismatch_before_handler_runs() {
        #[derive(Debug)]
        struct Impostor;

        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let method = HandlerMethod::new(Arc::new(Echo), "touch", move |_: Arc<Echo>| {
            flag.store(true, Ordering::SeqCst);
            async { Ok::<_, Infallible>(()) }
        })
        .with_receiver(Arc::new(Impostor));

        let err = invoke(&InvocableHandlerMethod::new(method), &[]).await.unwrap_err();
        match &err {
            InvocationError::ReceiverMismatch {
                expected, actual, details,
            } => {
                assert!(expected.ends_with("Echo"));
                assert!(actual.ends_with("Impostor"));
                assert!(details.contains("HandlerMethod details:"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[derive(Debug)]
    struct Rejected {
        tag: Arc<()>,
    }

    impl fmt::Display for Rejected {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("rejected")
        }
    }

    impl std::error::Error for Rejected {}

    #[tokio::test]
    async fn test_target_error_is_not_wrapped() {
        let tag = Arc::new(());
        let returned = Arc::clone(&tag);
        let method = HandlerMethod::new(Arc::new(Echo), "reject", move |_: Arc<Echo>| {
            let tag = Arc::clone(&returned);
            async move { Err::<(), _>(Rejected { tag }) }
        });

        let err = invoke(&InvocableHandlerMethod::new(method), &[]).await.unwrap_err();
        let failure: &HandlerFailure = err.failure().unwrap();
        let rejected = failure.downcast_ref::<Rejected>().unwrap();
        assert!(Arc::ptr_eq(&rejected.tag, &tag));
        assert_eq!(err.to_string(), "rejected");
    }

    #[tokio::test]
    async fn test_panic_becomes_invocation_error() {
        let method = HandlerMethod::new(Arc::new(Echo), "explode", |_: Arc<Echo>, n: u32| async move {
            if n > 0 {
                panic!("exploded with {n}");
            }
            Ok::<_, Infallible>(n)
        });

        let err = invoke(&InvocableHandlerMethod::new(method), &[ProvidedArg::value(3_u32)])
            .await
            .unwrap_err();
        match err {
            InvocationError::Invocation { message, details } => {
                assert!(message.contains("exploded with 3"));
                assert!(details.contains("[0] [type=u32] [value=3]"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    #[should_panic(expected = "left uncaught")]
    async fn test_panics_propagate_when_not_caught() {
        let method = HandlerMethod::new(Arc::new(Echo), "explode", |_: Arc<Echo>, fail: bool| async move {
            assert!(!fail, "left uncaught");
            Ok::<_, Infallible>(())
        });
        let mut invocable = InvocableHandlerMethod::new(method);
        invocable.set_catch_panics(false);
        let _ = invoke(&invocable, &[ProvidedArg::value(true)]).await;
    }

    #[tokio::test]
    async fn test_mistyped_resolver_value_is_invocation_error() {
        let mut invocable = InvocableHandlerMethod::new(echo());
        invocable.set_resolvers(chain(ResolverChain::new().with(FnResolver::for_type::<i64, _>(
            |_, _, _| Ok(HandlerValue::new("not a number")),
        ))));

        let err = invoke(&invocable, &[ProvidedArg::value(String::from("a"))])
            .await
            .unwrap_err();
        match err {
            InvocationError::Invocation { message, details } => {
                assert!(message.contains("index 1"));
                assert!(details.contains("[1] [type=&str] [value=\"not a number\"]"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_named_parameters_with_binder() {
        let mut invocable = InvocableHandlerMethod::new(echo());
        invocable.set_parameter_names(["a", "b"]);
        invocable.set_resolvers(chain(ResolverChain::new().with(RequestParamResolver::new())));
        invocable.set_binder_factory(Arc::new(DefaultBinderFactory::default()));

        let request = NativeRequest::builder().uri("/echo?a=x&b=-3").build();
        let value = invocable
            .invoke_for_request(&request, &mut ModelContainer::new(), &[])
            .await
            .unwrap();
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("x:-3"));
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl InvocationObserver for Recorder {
        fn before_resolve(&self, _method: &HandlerMethod, parameter: &MethodParameter) {
            self.events.lock().push(format!("resolve {}", parameter.index()));
        }

        fn before_invoke(&self, _method: &HandlerMethod, args: &[HandlerValue]) {
            self.events.lock().push(format!("invoke {}", args.len()));
        }

        fn after_invoke(&self, _method: &HandlerMethod, _value: &HandlerValue) {
            self.events.lock().push("done".to_string());
        }

        fn on_failure(&self, _method: &HandlerMethod, _error: &InvocationError) {
            self.events.lock().push("failed".to_string());
        }
    }

    #[tokio::test]
    async fn test_observer_sees_each_step() {
        let recorder = Arc::new(Recorder::default());
        let mut invocable = InvocableHandlerMethod::new(echo());
        invocable.set_observer(recorder.clone());
        invocable.set_resolvers(chain(ResolverChain::new().with(FnResolver::constant(1_i64))));

        invoke(&invocable, &[ProvidedArg::value(String::new())]).await.unwrap();
        assert_eq!(
            *recorder.events.lock(),
            vec!["resolve 0", "resolve 1", "invoke 2", "done"]
        );

        recorder.events.lock().clear();
        invocable.set_resolvers(chain(ResolverChain::new()));
        invoke(&invocable, &[ProvidedArg::value(String::new())])
            .await
            .unwrap_err();
        assert_eq!(*recorder.events.lock(), vec!["resolve 0", "resolve 1", "failed"]);
    }
}
