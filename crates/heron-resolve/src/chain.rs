//! Ordered composite of resolvers.

use crate::ArgumentResolver;
use dashmap::DashMap;
use heron_core::{
    DataBinderFactory, HandlerValue, MethodId, MethodParameter, ModelContainer, NativeRequest,
    ResolutionError,
};
use std::fmt;
use std::sync::Arc;

/// Resolves parameters by delegating to a list of [`ArgumentResolver`]s.
///
/// Resolvers are consulted in registration order and the first one that
/// supports a parameter wins. The choice is cached per method and parameter
/// index, so a chain shared across concurrent invocations only runs the
/// support checks once per parameter.
///
/// # Example
///
/// ```rust
/// use heron_core::{MethodId, MethodParameter, ModelContainer, NativeRequest, TypeKey};
/// use heron_resolve::{ArgumentResolver, FnResolver, ResolverChain};
///
/// let chain = ResolverChain::new()
///     .with(FnResolver::constant(1_u32))
///     .with(FnResolver::constant(2_u32));
///
/// let parameter = MethodParameter::new(MethodId::next(), "f(u32)", 0, TypeKey::of::<u32>());
/// let value = chain
///     .resolve_argument(&parameter, &mut ModelContainer::new(), &NativeRequest::builder().build(), None)
///     .unwrap();
///
/// // The first supporting resolver wins.
/// assert_eq!(value.downcast_ref::<u32>(), Some(&1));
/// ```
#[derive(Default)]
pub struct ResolverChain {
    resolvers: Vec<Arc<dyn ArgumentResolver>>,
    cache: DashMap<(MethodId, usize), usize>,
}

impl ResolverChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a resolver.
    pub fn add<R: ArgumentResolver + 'static>(&mut self, resolver: R) -> &mut Self {
        self.resolvers.push(Arc::new(resolver));
        self
    }

    /// Appends an already shared resolver.
    pub fn add_shared(&mut self, resolver: Arc<dyn ArgumentResolver>) -> &mut Self {
        self.resolvers.push(resolver);
        self
    }

    /// Appends a resolver, builder style.
    #[must_use]
    pub fn with<R: ArgumentResolver + 'static>(mut self, resolver: R) -> Self {
        self.add(resolver);
        self
    }

    /// Appends several shared resolvers in order.
    pub fn add_all<I>(&mut self, resolvers: I) -> &mut Self
    where
        I: IntoIterator<Item = Arc<dyn ArgumentResolver>>,
    {
        self.resolvers.extend(resolvers);
        self
    }

    /// Returns the number of resolvers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Returns `true` if the chain has no resolvers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Returns the resolvers in consultation order.
    #[must_use]
    pub fn resolvers(&self) -> &[Arc<dyn ArgumentResolver>] {
        &self.resolvers
    }

    /// Forgets every cached resolver choice.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn find_resolver(&self, parameter: &MethodParameter) -> Option<&Arc<dyn ArgumentResolver>> {
        let key = (parameter.method_id(), parameter.index());
        if let Some(position) = self.cache.get(&key).map(|entry| *entry) {
            return self.resolvers.get(position);
        }

        let (position, resolver) = self
            .resolvers
            .iter()
            .enumerate()
            .find(|(_, resolver)| resolver.supports_parameter(parameter))?;

        tracing::trace!(
            resolver = resolver.name(),
            param_index = parameter.index(),
            param_type = parameter.type_name(),
            "selected argument resolver"
        );
        self.cache.insert(key, position);
        Some(resolver)
    }
}

impl ArgumentResolver for ResolverChain {
    fn supports_parameter(&self, parameter: &MethodParameter) -> bool {
        self.find_resolver(parameter).is_some()
    }

    fn resolve_argument(
        &self,
        parameter: &MethodParameter,
        container: &mut ModelContainer,
        request: &NativeRequest,
        binder_factory: Option<&dyn DataBinderFactory>,
    ) -> Result<HandlerValue, ResolutionError> {
        let resolver = self.find_resolver(parameter).ok_or_else(|| {
            ResolutionError::unsupported(parameter.type_name(), parameter.index())
        })?;
        resolver.resolve_argument(parameter, container, request, binder_factory)
    }
}

impl Clone for ResolverChain {
    fn clone(&self) -> Self {
        Self {
            resolvers: self.resolvers.clone(),
            cache: DashMap::new(),
        }
    }
}

impl fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.resolvers.iter().map(|r| r.name()).collect();
        f.debug_struct("ResolverChain")
            .field("resolvers", &names)
            .field("cached", &self.cache.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnResolver;
    use heron_core::{RequestSource, TypeKey};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn parameter<T: 'static>(method: MethodId, index: usize) -> MethodParameter {
        MethodParameter::new(method, "handler", index, TypeKey::of::<T>())
    }

    fn resolve(chain: &ResolverChain, parameter: &MethodParameter) -> Result<HandlerValue, ResolutionError> {
        chain.resolve_argument(
            parameter,
            &mut ModelContainer::new(),
            &NativeRequest::builder().build(),
            None,
        )
    }

    #[test]
    fn test_empty_chain_supports_nothing() {
        let chain = ResolverChain::new();
        let param = parameter::<String>(MethodId::next(), 0);

        assert!(chain.is_empty());
        assert!(!chain.supports_parameter(&param));
        let err = resolve(&chain, &param).unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_first_supporting_resolver_wins() {
        let chain = ResolverChain::new()
            .with(FnResolver::constant(7_i64))
            .with(FnResolver::constant(String::from("a")))
            .with(FnResolver::constant(String::from("b")));

        assert_eq!(chain.len(), 3);
        let value = resolve(&chain, &parameter::<String>(MethodId::next(), 0)).unwrap();
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("a"));
    }

    #[test]
    fn test_resolver_errors_propagate_unchanged() {
        let chain = ResolverChain::new().with(FnResolver::for_type::<u32, _>(|_, _, _| {
            Err(ResolutionError::missing(RequestSource::Header, "x-count"))
        }));
        let err = resolve(&chain, &parameter::<u32>(MethodId::next(), 0)).unwrap_err();
        assert_eq!(err.field(), Some("x-count"));
        assert_eq!(err.request_source(), RequestSource::Header);
    }

    #[test]
    fn test_support_checks_are_cached_per_parameter() {
        let checks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&checks);
        let chain = ResolverChain::new().with(FnResolver::new(
            move |p| {
                counter.fetch_add(1, Ordering::SeqCst);
                p.is::<u8>()
            },
            |_, _, _| Ok(HandlerValue::new(1_u8)),
        ));

        let method = MethodId::next();
        let param = parameter::<u8>(method, 0);
        for _ in 0..3 {
            assert!(chain.supports_parameter(&param));
            resolve(&chain, &param).unwrap();
        }
        assert_eq!(checks.load(Ordering::SeqCst), 1);

        // A different parameter index is a different cache entry.
        assert!(chain.supports_parameter(&parameter::<u8>(method, 1)));
        assert_eq!(checks.load(Ordering::SeqCst), 2);

        chain.clear_cache();
        assert!(chain.supports_parameter(&param));
        assert_eq!(checks.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unsupported_parameters_are_not_cached() {
        let mut chain = ResolverChain::new();
        let param = parameter::<bool>(MethodId::next(), 0);
        assert!(!chain.supports_parameter(&param));

        chain.add(FnResolver::constant(true));
        assert!(chain.supports_parameter(&param));
    }

    #[test]
    fn test_add_all_keeps_order() {
        let shared: Vec<Arc<dyn ArgumentResolver>> = vec![
            Arc::new(FnResolver::constant(1_u16)),
            Arc::new(FnResolver::constant(2_u16)),
        ];
        let mut chain = ResolverChain::new();
        chain.add_all(shared);

        let value = resolve(&chain, &parameter::<u16>(MethodId::next(), 0)).unwrap();
        assert_eq!(value.downcast_ref::<u16>(), Some(&1));
        assert_eq!(chain.resolvers().len(), 2);
    }

    #[test]
    fn test_clone_starts_with_empty_cache() {
        let chain = ResolverChain::new().with(FnResolver::constant(1_u64));
        assert!(chain.supports_parameter(&parameter::<u64>(MethodId::next(), 0)));

        let cloned = chain.clone();
        assert_eq!(cloned.len(), 1);
        assert!(format!("{cloned:?}").contains("cached: 0"));
    }
}
