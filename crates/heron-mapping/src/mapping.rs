//! URL-to-handler-name registry.

use crate::pattern::{is_pattern, PathPattern};
use crate::strategy::{DetermineUrls, UrlStrategy};
use crate::MappingError;
use heron_core::NameLookup;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Maps URL paths to handler names detected in a [`NameLookup`].
///
/// Detection enumerates every name the lookup knows, asks the
/// [`UrlStrategy`] which URLs the name serves, and registers each URL. Names
/// without URLs are skipped.
///
/// # Registration rules
///
/// - A URL maps to one name; registering a different name for it fails,
///   registering the same name again does nothing
/// - `/` sets the root handler, `/*` the default handler
/// - URLs containing `*` or `?` are patterns
///
/// # Lookup order
///
/// Exact match, then the most specific matching pattern, then the root
/// handler for `/`, then the default handler.
///
/// # Example
///
/// ```rust
/// use heron_core::BeanRegistry;
/// use heron_mapping::UrlHandlerMapping;
/// use std::sync::Arc;
///
/// let mut registry = BeanRegistry::new();
/// registry.register("/users", Arc::new(())).unwrap();
/// registry.register("/users/**", Arc::new(())).unwrap();
///
/// let mut mapping = UrlHandlerMapping::bean_name();
/// mapping.detect_handlers(&registry).unwrap();
///
/// assert_eq!(mapping.lookup_handler("/users"), Some("/users"));
/// assert_eq!(mapping.lookup_handler("/users/7/orders"), Some("/users/**"));
/// assert_eq!(mapping.lookup_handler("/orders"), None);
/// ```
#[derive(Debug, Clone)]
pub struct UrlHandlerMapping {
    strategy: UrlStrategy,
    detect_in_ancestors: bool,
    require_leading_slash: bool,
    handler_map: IndexMap<String, String>,
    patterns: Vec<(PathPattern, String)>,
    root_handler: Option<String>,
    default_handler: Option<String>,
}

impl UrlHandlerMapping {
    /// Creates an empty mapping using `strategy`.
    #[must_use]
    pub fn new(strategy: UrlStrategy) -> Self {
        Self {
            strategy,
            detect_in_ancestors: false,
            require_leading_slash: true,
            handler_map: IndexMap::new(),
            patterns: Vec::new(),
            root_handler: None,
            default_handler: None,
        }
    }

    /// Creates an empty mapping that treats names starting with `/` as URLs.
    #[must_use]
    pub fn bean_name() -> Self {
        Self::new(UrlStrategy::BeanName)
    }

    /// Also detect names in the lookup's ancestors. Off by default.
    pub fn set_detect_in_ancestors(&mut self, detect: bool) {
        self.detect_in_ancestors = detect;
    }

    /// Builder form of [`set_detect_in_ancestors`](Self::set_detect_in_ancestors).
    #[must_use]
    pub fn with_detect_in_ancestors(mut self, detect: bool) -> Self {
        self.set_detect_in_ancestors(detect);
        self
    }

    /// When on (the default), URLs must start with `/`; detection skips
    /// others and [`register_handler`](Self::register_handler) rejects them.
    /// When off, a leading `/` is added.
    pub fn set_require_leading_slash(&mut self, required: bool) {
        self.require_leading_slash = required;
    }

    /// Returns the URL strategy.
    #[must_use]
    pub fn strategy(&self) -> &UrlStrategy {
        &self.strategy
    }

    /// Registers the URLs of every name in `lookup`.
    ///
    /// Returns the number of names registered as handlers.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::AmbiguousMapping`] if two names claim the same
    /// URL. Mappings registered before the conflict are kept.
    pub fn detect_handlers(&mut self, lookup: &dyn NameLookup) -> Result<usize, MappingError> {
        tracing::debug!(
            detect_in_ancestors = self.detect_in_ancestors,
            strategy = ?self.strategy,
            "looking for URL mappings"
        );

        let mut detected = 0;
        for name in self.candidate_names(lookup) {
            let urls = self.strategy.determine_urls(&name, lookup);
            let urls = self.normalize_detected(&name, urls);
            if urls.is_empty() {
                tracing::debug!(bean_name = %name, "rejected bean name: no URL paths identified");
                continue;
            }
            self.register_handlers(&urls, &name)?;
            detected += 1;
        }
        Ok(detected)
    }

    fn candidate_names(&self, lookup: &dyn NameLookup) -> Vec<String> {
        let mut names = lookup.names();
        if self.detect_in_ancestors {
            let mut seen: HashSet<String> = names.iter().cloned().collect();
            let mut ancestor = lookup.parent();
            while let Some(current) = ancestor {
                names.extend(current.names().into_iter().filter(|n| seen.insert(n.clone())));
                ancestor = current.parent();
            }
        }
        names
    }

    fn normalize_detected(&self, name: &str, urls: Vec<String>) -> Vec<String> {
        urls.into_iter()
            .filter_map(|url| match self.normalize(&url, name) {
                Ok(url) => Some(url),
                Err(err) => {
                    tracing::debug!(bean_name = %name, url = %url, error = %err, "skipping URL");
                    None
                }
            })
            .collect()
    }

    fn normalize(&self, url: &str, name: &str) -> Result<String, MappingError> {
        if url.starts_with('/') {
            Ok(url.to_string())
        } else if self.require_leading_slash {
            Err(MappingError::InvalidUrl {
                url: url.to_string(),
                name: name.to_string(),
            })
        } else {
            Ok(format!("/{url}"))
        }
    }

    /// Registers `name` for each of `urls`.
    ///
    /// # Errors
    ///
    /// Fails on the first URL that cannot be registered.
    pub fn register_handlers<S: AsRef<str>>(
        &mut self,
        urls: &[S],
        name: &str,
    ) -> Result<(), MappingError> {
        urls.iter()
            .try_for_each(|url| self.register_handler(url.as_ref(), name))
    }

    /// Registers `name` for `url`.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::AmbiguousMapping`] if another name is mapped
    /// to `url`, or [`MappingError::InvalidUrl`] if `url` lacks the required
    /// leading `/`.
    pub fn register_handler(&mut self, url: &str, name: &str) -> Result<(), MappingError> {
        let url = self.normalize(url, name)?;

        if let Some(existing) = self.handler_map.get(&url) {
            if existing == name {
                return Ok(());
            }
            return Err(MappingError::AmbiguousMapping {
                url,
                existing: existing.clone(),
                attempted: name.to_string(),
            });
        }

        match url.as_str() {
            "/" => {
                tracing::trace!(bean_name = %name, "root mapping");
                self.root_handler = Some(name.to_string());
            }
            "/*" => {
                tracing::trace!(bean_name = %name, "default mapping");
                self.default_handler = Some(name.to_string());
            }
            _ => {
                tracing::trace!(url = %url, bean_name = %name, "mapped URL path");
            }
        }
        if is_pattern(&url) {
            self.patterns.push((PathPattern::parse(&url), name.to_string()));
        }
        self.handler_map.insert(url, name.to_string());
        Ok(())
    }

    /// Returns the handler name for a request path.
    #[must_use]
    pub fn lookup_handler(&self, path: &str) -> Option<&str> {
        if let Some(name) = self.handler_map.get(path) {
            return Some(name);
        }
        if let Some(name) = self.lookup_pattern(path) {
            return Some(name);
        }
        if path == "/" {
            if let Some(root) = &self.root_handler {
                return Some(root);
            }
        }
        self.default_handler.as_deref()
    }

    fn lookup_pattern(&self, path: &str) -> Option<&str> {
        let mut best: Option<&(PathPattern, String)> = None;
        for candidate in self.patterns.iter().filter(|(p, _)| p.matches(path)) {
            match best {
                Some(current) => match candidate.0.compare_specificity(&current.0) {
                    std::cmp::Ordering::Greater => best = Some(candidate),
                    std::cmp::Ordering::Equal => tracing::warn!(
                        request_path = %path,
                        chosen = current.0.as_str(),
                        ignored = candidate.0.as_str(),
                        "equally specific patterns match; using the first registered"
                    ),
                    std::cmp::Ordering::Less => {}
                },
                None => best = Some(candidate),
            }
        }
        best.map(|(_, name)| name.as_str())
    }

    /// Returns the registered URL-to-name mappings in registration order.
    #[must_use]
    pub fn handler_map(&self) -> &IndexMap<String, String> {
        &self.handler_map
    }

    /// Returns the name mapped to `/`.
    #[must_use]
    pub fn root_handler(&self) -> Option<&str> {
        self.root_handler.as_deref()
    }

    /// Returns the name used when nothing else matches.
    #[must_use]
    pub fn default_handler(&self) -> Option<&str> {
        self.default_handler.as_deref()
    }

    /// Sets the name used when nothing else matches.
    pub fn set_default_handler(&mut self, name: impl Into<String>) {
        self.default_handler = Some(name.into());
    }
}

impl Default for UrlHandlerMapping {
    fn default() -> Self {
        Self::bean_name()
    }
}
