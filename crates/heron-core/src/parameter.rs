//! Handler parameter descriptors.

use crate::TypeKey;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_METHOD_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a handler method.
///
/// Used as part of the cache key when a resolver chain remembers which
/// resolver serves which parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId(u64);

impl MethodId {
    /// Allocates a fresh identifier.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_METHOD_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One formal parameter of a handler method.
///
/// A `MethodParameter` is a view into its method's descriptor: it knows its
/// position, its declared type and, when configured, its name. Resolvers use
/// it to decide whether they can produce a value, and the invocable handler
/// uses it to match provided arguments.
///
/// # Example
///
/// ```
/// use heron_core::{MethodId, MethodParameter, TypeKey};
///
/// let param = MethodParameter::new(MethodId::next(), "show(u64)", 0, TypeKey::of::<u64>())
///     .with_name("id");
///
/// assert_eq!(param.index(), 0);
/// assert_eq!(param.name(), Some("id"));
/// assert!(param.is::<u64>());
/// ```
#[derive(Debug, Clone)]
pub struct MethodParameter {
    method_id: MethodId,
    signature: Arc<str>,
    index: usize,
    type_key: TypeKey,
    name: Option<Arc<str>>,
}

impl MethodParameter {
    /// Creates a parameter descriptor.
    pub fn new(
        method_id: MethodId,
        signature: impl Into<Arc<str>>,
        index: usize,
        type_key: TypeKey,
    ) -> Self {
        Self {
            method_id,
            signature: signature.into(),
            index,
            type_key,
            name: None,
        }
    }

    /// Returns the descriptor with the given parameter name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets or clears the parameter name.
    pub fn set_name(&mut self, name: Option<Arc<str>>) {
        self.name = name;
    }

    /// Returns the id of the declaring method.
    #[must_use]
    pub const fn method_id(&self) -> MethodId {
        self.method_id
    }

    /// Returns the declaring method's signature.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Returns the zero-based position of the parameter.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns the declared type.
    #[must_use]
    pub const fn type_key(&self) -> TypeKey {
        self.type_key
    }

    /// Returns the declared type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_key.name()
    }

    /// Returns `true` if the declared type is `T`.
    #[must_use]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.type_key.is::<T>()
    }

    /// Returns the parameter name, if one was configured.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for MethodParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parameter [{}] of type '{}'", self.index, self.type_key.name())?;
        if let Some(name) = &self.name {
            write!(f, " named '{name}'")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_ids_are_unique() {
        let a = MethodId::next();
        let b = MethodId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn test_display_with_and_without_name() {
        let param = MethodParameter::new(MethodId::next(), "f(bool)", 2, TypeKey::of::<bool>());
        assert_eq!(param.to_string(), "parameter [2] of type 'bool'");

        let named = param.with_name("flag");
        assert_eq!(named.to_string(), "parameter [2] of type 'bool' named 'flag'");
        assert_eq!(named.signature(), "f(bool)");
    }

    #[test]
    fn test_set_name_clears() {
        let mut param =
            MethodParameter::new(MethodId::next(), "f(u8)", 0, TypeKey::of::<u8>()).with_name("x");
        param.set_name(None);
        assert!(param.name().is_none());
    }
}
