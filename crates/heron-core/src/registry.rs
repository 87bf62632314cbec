//! Named object registry.
//!
//! Handler objects are registered under a name, optionally with aliases and
//! declared URL paths. URL detection enumerates names through the
//! [`NameLookup`] trait and the dispatcher resolves the winning name back to
//! its object.
//!
//! # Example
//!
//! ```rust
//! use heron_core::registry::{BeanRegistry, NameLookup};
//! use std::sync::Arc;
//!
//! struct Greeter;
//!
//! let mut registry = BeanRegistry::new();
//! registry.register("/hello", Arc::new(Greeter)).unwrap();
//! registry.alias("/hello", "/hi").unwrap();
//!
//! assert_eq!(registry.aliases("/hello"), vec!["/hi"]);
//! assert!(registry.resolve::<Greeter>("/hi").is_some());
//! ```

use crate::TypeKey;
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by [`BeanRegistry`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A name or alias is already taken.
    #[error("cannot register '{name}': name already in use")]
    DuplicateName {
        /// The conflicting name.
        name: String,
    },

    /// No object is registered under the name.
    #[error("no object registered under '{name}'")]
    NotRegistered {
        /// The requested name.
        name: String,
    },

    /// The object exists but has a different type.
    #[error("object '{name}' is a {actual}, not a {expected}")]
    TypeMismatch {
        /// The requested name.
        name: String,
        /// The requested type.
        expected: &'static str,
        /// The registered object's type.
        actual: &'static str,
    },
}

/// Read-only enumeration of named objects and their aliases.
///
/// This is the collaborator URL detection consumes; [`BeanRegistry`] is the
/// bundled implementation.
pub trait NameLookup: Send + Sync {
    /// Returns all registered names, in registration order.
    fn names(&self) -> Vec<String>;

    /// Returns the aliases of a name (empty if unknown).
    fn aliases(&self, name: &str) -> Vec<String>;

    /// Returns URL paths declared for a name at registration time.
    fn declared_urls(&self, _name: &str) -> Vec<String> {
        Vec::new()
    }

    /// Returns the enclosing lookup, if any.
    fn parent(&self) -> Option<&dyn NameLookup> {
        None
    }
}

#[derive(Clone)]
struct Entry {
    instance: Arc<dyn Any + Send + Sync>,
    type_key: TypeKey,
    declared_urls: Vec<String>,
}

/// Registry of named, `Arc`-shared objects.
///
/// Lookups that miss fall through to the parent registry.
#[derive(Clone, Default)]
pub struct BeanRegistry {
    entries: IndexMap<String, Entry>,
    aliases: IndexMap<String, String>,
    parent: Option<Arc<BeanRegistry>>,
}

impl BeanRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry nested in `parent`.
    #[must_use]
    pub fn with_parent(parent: Arc<BeanRegistry>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }

    /// Registers an object.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if the name is already used
    /// by an object or an alias in this registry.
    pub fn register<T: Send + Sync + 'static>(
        &mut self,
        name: impl Into<String>,
        instance: Arc<T>,
    ) -> Result<(), RegistryError> {
        self.register_with_urls(name, instance, Vec::<String>::new())
    }

    /// Registers an object together with the URL paths it declares.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if the name is taken.
    pub fn register_with_urls<T, I, S>(
        &mut self,
        name: impl Into<String>,
        instance: Arc<T>,
        urls: I,
    ) -> Result<(), RegistryError>
    where
        T: Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if self.is_name_in_use(&name) {
            return Err(RegistryError::DuplicateName { name });
        }
        self.entries.insert(
            name,
            Entry {
                instance,
                type_key: TypeKey::of::<T>(),
                declared_urls: urls.into_iter().map(Into::into).collect(),
            },
        );
        Ok(())
    }

    /// Registers `alias` as another name for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] if `name` is unknown in this
    /// registry, or [`RegistryError::DuplicateName`] if `alias` is taken.
    pub fn alias(
        &mut self,
        name: impl Into<String>,
        alias: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let alias = alias.into();
        let canonical = self.canonical_name(&name).map(str::to_owned).ok_or_else(|| {
            RegistryError::NotRegistered { name: name.clone() }
        })?;
        if self.is_name_in_use(&alias) {
            return Err(RegistryError::DuplicateName { name: alias });
        }
        self.aliases.insert(alias, canonical);
        Ok(())
    }

    fn is_name_in_use(&self, name: &str) -> bool {
        self.entries.contains_key(name) || self.aliases.contains_key(name)
    }

    fn canonical_name<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if self.entries.contains_key(name) {
            return Some(name);
        }
        self.aliases.get(name).map(String::as_str)
    }

    /// Returns the erased object and its type for a name or alias.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<(Arc<dyn Any + Send + Sync>, TypeKey)> {
        match self.canonical_name(name).and_then(|n| self.entries.get(n)) {
            Some(entry) => Some((Arc::clone(&entry.instance), entry.type_key)),
            None => self.parent.as_ref().and_then(|p| p.get(name)),
        }
    }

    /// Resolves an object by name or alias.
    ///
    /// Returns `None` if nothing is registered under the name or the object
    /// is not a `T`.
    #[must_use]
    pub fn resolve<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.get(name)
            .and_then(|(instance, _)| instance.downcast::<T>().ok())
    }

    /// Resolves an object or explains why it cannot.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] or
    /// [`RegistryError::TypeMismatch`].
    pub fn resolve_required<T: Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Arc<T>, RegistryError> {
        let (instance, type_key) = self.get(name).ok_or_else(|| RegistryError::NotRegistered {
            name: name.to_string(),
        })?;
        instance
            .downcast::<T>()
            .map_err(|_| RegistryError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
                actual: type_key.name(),
            })
    }

    /// Returns `true` if the name or alias resolves, here or in a parent.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the number of objects registered directly in this registry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if this registry holds no objects of its own.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl NameLookup for BeanRegistry {
    fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn aliases(&self, name: &str) -> Vec<String> {
        let Some(canonical) = self.canonical_name(name) else {
            return self
                .parent
                .as_ref()
                .map(|p| p.aliases(name))
                .unwrap_or_default();
        };
        self.aliases
            .iter()
            .filter(|(alias, target)| target.as_str() == canonical && alias.as_str() != name)
            .map(|(alias, _)| alias.clone())
            .collect()
    }

    fn declared_urls(&self, name: &str) -> Vec<String> {
        match self.canonical_name(name).and_then(|n| self.entries.get(n)) {
            Some(entry) => entry.declared_urls.clone(),
            None => self
                .parent
                .as_ref()
                .map(|p| p.declared_urls(name))
                .unwrap_or_default(),
        }
    }

    fn parent(&self) -> Option<&dyn NameLookup> {
        self.parent.as_deref().map(|p| p as &dyn NameLookup)
    }
}

impl fmt::Debug for BeanRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanRegistry")
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .field("aliases", &self.aliases)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}
