//! Type-erased handler values.
//!
//! A [`HandlerValue`] carries one argument or return value between resolvers,
//! the invocable handler and its caller without knowing its static type.

use crate::TypeKey;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

type DebugFn = fn(&(dyn Any + Send + Sync), &mut fmt::Formatter<'_>) -> fmt::Result;

fn debug_erased<T: fmt::Debug + 'static>(
    value: &(dyn Any + Send + Sync),
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    match value.downcast_ref::<T>() {
        Some(value) => fmt::Debug::fmt(value, f),
        None => f.write_str("<unprintable>"),
    }
}

/// A type-erased, cheaply clonable value.
///
/// Cloning a `HandlerValue` shares the underlying allocation. The value keeps
/// its [`TypeKey`] and a `Debug` rendering so that diagnostics can dump
/// argument lists without knowing the concrete types.
///
/// Absence is expressed in the type: a resolver that may produce "no value"
/// for an `Option<T>` parameter produces `HandlerValue::new(None::<T>)`.
///
/// # Example
///
/// ```
/// use heron_core::HandlerValue;
///
/// let value = HandlerValue::new(42_i64);
/// assert!(value.is::<i64>());
/// assert_eq!(value.downcast_ref::<i64>(), Some(&42));
/// assert_eq!(value.repr(), "42");
///
/// let owned: i64 = value.take().unwrap();
/// assert_eq!(owned, 42);
/// ```
#[derive(Clone)]
pub struct HandlerValue {
    inner: Arc<dyn Any + Send + Sync>,
    type_key: TypeKey,
    debug: DebugFn,
}

impl HandlerValue {
    /// Wraps a value.
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync + fmt::Debug,
    {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an already shared value without copying it.
    pub fn from_arc<T>(value: Arc<T>) -> Self
    where
        T: Any + Send + Sync + fmt::Debug,
    {
        Self {
            inner: value,
            type_key: TypeKey::of::<T>(),
            debug: debug_erased::<T>,
        }
    }

    /// The unit value, returned by handlers that produce nothing.
    pub fn unit() -> Self {
        Self::new(())
    }

    /// Returns the type key of the wrapped value.
    #[must_use]
    pub const fn type_key(&self) -> TypeKey {
        self.type_key
    }

    /// Returns the type name of the wrapped value.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_key.name()
    }

    /// Returns `true` if the wrapped value is a `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_key.is::<T>()
    }

    /// Borrows the wrapped value as a `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Returns the shared value as an `Arc<T>`, or gives `self` back.
    pub fn downcast_arc<T>(self) -> Result<Arc<T>, Self>
    where
        T: Any + Send + Sync,
    {
        let Self {
            inner,
            type_key,
            debug,
        } = self;
        inner.downcast::<T>().map_err(|inner| Self {
            inner,
            type_key,
            debug,
        })
    }

    /// Takes the value out as an owned `T`.
    ///
    /// The value is moved out when this is the only handle to it and cloned
    /// otherwise, which is the case for provided arguments matched to more
    /// than one parameter.
    pub fn take<T>(self) -> Result<T, Self>
    where
        T: Any + Send + Sync + Clone,
    {
        self.downcast_arc::<T>()
            .map(|shared| Arc::try_unwrap(shared).unwrap_or_else(|shared| (*shared).clone()))
    }

    /// Returns `true` if both values share the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Renders the wrapped value with its `Debug` implementation.
    #[must_use]
    pub fn repr(&self) -> String {
        format!("{}", DebugValue(self))
    }
}

struct DebugValue<'a>(&'a HandlerValue);

impl fmt::Display for DebugValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.0.debug)(&*self.0.inner, f)
    }
}

impl fmt::Debug for HandlerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerValue({}: ", self.type_key.name())?;
        (self.debug)(&*self.inner, f)?;
        f.write_str(")")
    }
}
