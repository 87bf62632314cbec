//! Request dispatch: URL lookup, handler invocation.

use crate::DispatchError;
use anyhow::Context;
use heron_config::{ConfigLoader, HeronConfig, UrlStrategyKind};
use heron_core::{BeanRegistry, DataBinderFactory, HandlerValue, ModelContainer, NativeRequest};
use heron_invoke::{
    HandlerMethod, InvocableHandlerMethod, InvocationObserver, ProvidedArg, TracingObserver,
};
use heron_mapping::{MappingError, UrlHandlerMapping, UrlStrategy};
use heron_resolve::{
    ModelContainerResolver, RedirectAttributesResolver, RequestParamResolver, RequestResolver,
    ResolverChain, SessionStatusResolver,
};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Environment prefix used by [`Dispatcher::from_config_file`].
pub const ENV_PREFIX: &str = "HERON";

/// Returns the resolver chain used when the builder is given none.
///
/// Per-request state first (model, redirect attributes, session status, the
/// request itself), then named query parameters.
#[must_use]
pub fn default_resolvers() -> ResolverChain {
    ResolverChain::new()
        .with(ModelContainerResolver)
        .with(RedirectAttributesResolver)
        .with(SessionStatusResolver)
        .with(RequestResolver)
        .with(RequestParamResolver::new())
}

/// Result of a successful dispatch.
#[derive(Debug)]
pub struct DispatchOutcome {
    /// Name the request path mapped to.
    pub handler: String,
    /// Value returned by the handler.
    pub value: HandlerValue,
    /// Per-request state after the handler ran.
    pub container: ModelContainer,
}

/// Maps request paths to handler methods and invokes them.
///
/// Handlers are [`HandlerMethod`]s registered in a [`BeanRegistry`]. URL
/// detection runs once, when the dispatcher is built.
///
/// # Example
///
/// ```rust
/// use heron::prelude::*;
/// use std::convert::Infallible;
/// use std::sync::Arc;
///
/// struct Greeter;
///
/// let hello = HandlerMethod::new(Arc::new(Greeter), "hello", |_: Arc<Greeter>, name: String| async move {
///     Ok::<_, Infallible>(format!("hello {name}"))
/// })
/// .with_parameter_names(["name"]);
///
/// let mut registry = BeanRegistry::new();
/// registry.register("/hello", Arc::new(hello)).unwrap();
///
/// let dispatcher = Dispatcher::builder(registry).build().unwrap();
/// let request = NativeRequest::builder().uri("/hello?name=heron").build();
///
/// let outcome = tokio_test::block_on(dispatcher.dispatch(&request)).unwrap();
/// assert_eq!(outcome.value.downcast_ref::<String>().map(String::as_str), Some("hello heron"));
/// ```
pub struct Dispatcher {
    mapping: UrlHandlerMapping,
    handlers: HashMap<String, InvocableHandlerMethod>,
    resolvers: Arc<ResolverChain>,
    config: HeronConfig,
}

impl Dispatcher {
    /// Creates a builder over `registry`.
    pub fn builder(registry: impl Into<Arc<BeanRegistry>>) -> DispatcherBuilder {
        DispatcherBuilder::new(registry.into())
    }

    /// Builds a dispatcher configured from a TOML or JSON file, with
    /// `HERON__SECTION__KEY` environment overrides.
    ///
    /// # Errors
    ///
    /// Fails if the configuration cannot be loaded or URL detection finds
    /// conflicting mappings.
    pub fn from_config_file(
        path: impl AsRef<Path>,
        registry: impl Into<Arc<BeanRegistry>>,
    ) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let config = ConfigLoader::new()
            .with_file(path)
            .and_then(|loader| loader.with_env_prefix(ENV_PREFIX).load())
            .with_context(|| format!("loading configuration from {}", path.display()))?;
        Self::builder(registry)
            .config(config)
            .build()
            .context("detecting handler mappings")
    }

    /// Returns the URL mapping.
    #[must_use]
    pub fn mapping(&self) -> &UrlHandlerMapping {
        &self.mapping
    }

    /// Returns the shared resolver chain.
    #[must_use]
    pub fn resolvers(&self) -> &Arc<ResolverChain> {
        &self.resolvers
    }

    /// Returns the configuration the dispatcher was built with.
    #[must_use]
    pub fn config(&self) -> &HeronConfig {
        &self.config
    }

    /// Returns the invocable handler registered under `name`.
    #[must_use]
    pub fn handler(&self, name: &str) -> Option<&InvocableHandlerMethod> {
        self.handlers.get(name)
    }

    /// Dispatches `request` to the handler mapped to its path.
    ///
    /// # Errors
    ///
    /// See [`DispatchError`].
    pub async fn dispatch(&self, request: &NativeRequest) -> Result<DispatchOutcome, DispatchError> {
        self.dispatch_with(request, &[]).await
    }

    /// Dispatches `request`, offering `provided` values before the resolver
    /// chain.
    ///
    /// # Errors
    ///
    /// See [`DispatchError`].
    pub async fn dispatch_with(
        &self,
        request: &NativeRequest,
        provided: &[ProvidedArg],
    ) -> Result<DispatchOutcome, DispatchError> {
        let path = request.path();
        let request_id = request.request_id();

        let Some(name) = self.mapping.lookup_handler(path) else {
            let err = DispatchError::NoHandlerFound {
                path: path.to_string(),
            };
            heron_telemetry::log_dispatch_error!(request_id, path, err);
            return Err(err);
        };
        let Some(handler) = self.handlers.get(name) else {
            let err = DispatchError::HandlerNotInvocable {
                name: name.to_string(),
            };
            heron_telemetry::log_dispatch_error!(request_id, path, err);
            return Err(err);
        };

        heron_telemetry::log_dispatch_start!(request_id, path, name);
        let mut container = ModelContainer::new();
        match handler.invoke_for_request(request, &mut container, provided).await {
            Ok(value) => Ok(DispatchOutcome {
                handler: name.to_string(),
                value,
                container,
            }),
            Err(err) => {
                heron_telemetry::log_dispatch_error!(request_id, path, err);
                Err(err.into())
            }
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("mapping", &self.mapping.handler_map())
            .field("handlers", &self.handlers.len())
            .field("resolvers", &self.resolvers.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    registry: Arc<BeanRegistry>,
    resolvers: Option<ResolverChain>,
    binder_factory: Option<Arc<dyn DataBinderFactory>>,
    observer: Option<Arc<dyn InvocationObserver>>,
    strategy: Option<UrlStrategy>,
    config: HeronConfig,
}

impl DispatcherBuilder {
    fn new(registry: Arc<BeanRegistry>) -> Self {
        Self {
            registry,
            resolvers: None,
            binder_factory: None,
            observer: None,
            strategy: None,
            config: HeronConfig::default(),
        }
    }

    /// Sets the configuration. Defaults to [`HeronConfig::default`].
    pub fn config(mut self, config: HeronConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the resolver chain. Defaults to [`default_resolvers`].
    pub fn resolvers(mut self, resolvers: ResolverChain) -> Self {
        self.resolvers = Some(resolvers);
        self
    }

    /// Sets the binder factory handed to converting resolvers.
    pub fn binder_factory(mut self, factory: Arc<dyn DataBinderFactory>) -> Self {
        self.binder_factory = Some(factory);
        self
    }

    /// Sets the invocation observer. Defaults to a [`TracingObserver`]
    /// following `invocation.trace_arguments`.
    pub fn observer(mut self, observer: Arc<dyn InvocationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Overrides the URL strategy chosen by `mapping.strategy`, e.g. with a
    /// custom one.
    pub fn url_strategy(mut self, strategy: UrlStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Detects URL mappings and prepares the handlers.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] if two names claim the same URL.
    pub fn build(self) -> Result<Dispatcher, MappingError> {
        let mapping_config = &self.config.mapping;
        let strategy = self.strategy.unwrap_or(match mapping_config.strategy {
            UrlStrategyKind::BeanName => UrlStrategy::BeanName,
            UrlStrategyKind::Declared => UrlStrategy::Declared,
        });

        let mut mapping = UrlHandlerMapping::new(strategy)
            .with_detect_in_ancestors(mapping_config.detect_in_ancestors);
        mapping.set_require_leading_slash(mapping_config.path_separator_required);
        mapping.detect_handlers(self.registry.as_ref())?;

        let resolvers = Arc::new(self.resolvers.unwrap_or_else(default_resolvers));
        let observer = self.observer.unwrap_or_else(|| {
            Arc::new(TracingObserver::new(self.config.invocation.trace_arguments))
        });

        let mut handlers = HashMap::new();
        let names = mapping
            .handler_map()
            .values()
            .map(String::as_str)
            .chain(mapping.default_handler());
        for name in names {
            if handlers.contains_key(name) {
                continue;
            }
            let Some(method) = self.registry.resolve::<HandlerMethod>(name) else {
                tracing::debug!(bean_name = name, "mapped object is not a handler method");
                continue;
            };
            let mut invocable = InvocableHandlerMethod::new(HandlerMethod::clone(&method));
            invocable.set_resolvers(Arc::clone(&resolvers));
            if let Some(factory) = &self.binder_factory {
                invocable.set_binder_factory(Arc::clone(factory));
            }
            invocable.set_observer(Arc::clone(&observer));
            invocable.set_catch_panics(self.config.invocation.catch_panics);
            handlers.insert(name.to_string(), invocable);
        }

        tracing::debug!(
            urls = mapping.handler_map().len(),
            handlers = handlers.len(),
            "dispatcher ready"
        );

        Ok(Dispatcher {
            mapping,
            handlers,
            resolvers,
            config: self.config,
        })
    }
}

impl fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("registry", &self.registry)
            .field("strategy", &self.strategy)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
