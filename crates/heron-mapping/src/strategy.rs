//! URL determination strategies.
//!
//! A strategy answers "which URL paths does this named object serve?".
//! Names for which it returns nothing are not handlers.

use heron_core::NameLookup;
use std::fmt;
use std::sync::Arc;

/// Determines the URL paths served by a named object.
pub trait DetermineUrls: Send + Sync {
    /// Returns the URL paths for `name`, possibly none.
    fn determine_urls(&self, name: &str, lookup: &dyn NameLookup) -> Vec<String>;
}

impl<F> DetermineUrls for F
where
    F: Fn(&str, &dyn NameLookup) -> Vec<String> + Send + Sync,
{
    fn determine_urls(&self, name: &str, lookup: &dyn NameLookup) -> Vec<String> {
        self(name, lookup)
    }
}

/// Treats a name, and each of its aliases, that starts with `/` as a URL.
///
/// ```rust
/// use heron_core::BeanRegistry;
/// use heron_mapping::{BeanNameUrls, DetermineUrls};
/// use std::sync::Arc;
///
/// let mut registry = BeanRegistry::new();
/// registry.register("/baz", Arc::new(())).unwrap();
/// registry.alias("/baz", "/qux").unwrap();
/// registry.alias("/baz", "baz-handler").unwrap();
///
/// assert_eq!(BeanNameUrls.determine_urls("/baz", &registry), vec!["/baz", "/qux"]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BeanNameUrls;

impl DetermineUrls for BeanNameUrls {
    fn determine_urls(&self, name: &str, lookup: &dyn NameLookup) -> Vec<String> {
        std::iter::once(name.to_string())
            .chain(lookup.aliases(name))
            .filter(|candidate| candidate.starts_with('/'))
            .collect()
    }
}

/// Uses the URL paths declared alongside each registered object.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredUrls;

impl DetermineUrls for DeclaredUrls {
    fn determine_urls(&self, name: &str, lookup: &dyn NameLookup) -> Vec<String> {
        lookup.declared_urls(name)
    }
}

/// The strategy a [`UrlHandlerMapping`](crate::UrlHandlerMapping) uses.
#[derive(Clone, Default)]
pub enum UrlStrategy {
    /// Names and aliases starting with `/`.
    #[default]
    BeanName,
    /// URLs declared at registration.
    Declared,
    /// Anything else.
    Custom(Arc<dyn DetermineUrls>),
}

impl UrlStrategy {
    /// Wraps a custom strategy.
    pub fn custom<D: DetermineUrls + 'static>(strategy: D) -> Self {
        Self::Custom(Arc::new(strategy))
    }
}

impl DetermineUrls for UrlStrategy {
    fn determine_urls(&self, name: &str, lookup: &dyn NameLookup) -> Vec<String> {
        match self {
            Self::BeanName => BeanNameUrls.determine_urls(name, lookup),
            Self::Declared => DeclaredUrls.determine_urls(name, lookup),
            Self::Custom(strategy) => strategy.determine_urls(name, lookup),
        }
    }
}

impl fmt::Debug for UrlStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BeanName => f.write_str("BeanName"),
            Self::Declared => f.write_str("Declared"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
