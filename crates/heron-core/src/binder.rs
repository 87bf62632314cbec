//! Data binding and type conversion.
//!
//! Resolvers that read raw strings from the request (query parameters, path
//! variables, headers) hand them to a [`WebDataBinder`] to obtain a value of
//! the parameter's declared type. Binders are created on demand by a
//! [`DataBinderFactory`]; resolvers that never convert never ask for one.
//!
//! # Example
//!
//! ```
//! use heron_core::binder::{ConversionService, DataBinderFactory, DefaultBinderFactory};
//! use heron_core::{NativeRequest, TypeKey};
//!
//! let factory = DefaultBinderFactory::new(ConversionService::with_defaults());
//! let request = NativeRequest::builder().build();
//! let binder = factory.create_binder(&request, "page").unwrap();
//!
//! let value = binder.convert("42", TypeKey::of::<u32>()).unwrap();
//! assert_eq!(value.downcast_ref::<u32>(), Some(&42));
//! ```

use crate::{HandlerValue, NativeRequest, RequestSource, ResolutionError, TypeKey};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

type Converter = Arc<dyn Fn(&str) -> Result<HandlerValue, String> + Send + Sync>;

/// Registry of string-to-type converters keyed by target type.
///
/// Registering a type through [`add_from_str`](Self::add_from_str) also
/// registers its `Option` form, whose absent value is `None`.
#[derive(Clone, Default)]
pub struct ConversionService {
    converters: HashMap<TypeId, (TypeKey, Converter)>,
    absent: HashMap<TypeId, HandlerValue>,
}

impl ConversionService {
    /// Creates a service with no converters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service converting to `String`, `bool`, the integer types
    /// and `f64`, plus their `Option` forms.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut service = Self::new();
        service.add_from_str::<String>();
        service.add_from_str::<bool>();
        service.add_from_str::<i32>();
        service.add_from_str::<i64>();
        service.add_from_str::<u16>();
        service.add_from_str::<u32>();
        service.add_from_str::<u64>();
        service.add_from_str::<usize>();
        service.add_from_str::<f64>();
        service
    }

    /// Registers a custom converter for `T`.
    pub fn register<T, F>(&mut self, convert: F)
    where
        T: Send + Sync + fmt::Debug + 'static,
        F: Fn(&str) -> Result<T, String> + Send + Sync + 'static,
    {
        let converter: Converter = Arc::new(move |raw| convert(raw).map(HandlerValue::new));
        self.converters
            .insert(TypeId::of::<T>(), (TypeKey::of::<T>(), converter));
    }

    /// Registers `T` and `Option<T>` through their `FromStr` implementation.
    pub fn add_from_str<T>(&mut self)
    where
        T: FromStr + Send + Sync + fmt::Debug + 'static,
        T::Err: fmt::Display,
    {
        self.register::<T, _>(|raw| raw.parse::<T>().map_err(|e| e.to_string()));
        self.register::<Option<T>, _>(|raw| raw.parse::<T>().map(Some).map_err(|e| e.to_string()));
        self.absent
            .insert(TypeId::of::<Option<T>>(), HandlerValue::new(None::<T>));
    }

    /// Returns `true` if a converter for `target` is registered.
    #[must_use]
    pub fn can_convert(&self, target: TypeKey) -> bool {
        self.converters.contains_key(&target.id())
    }

    /// Converts `raw` to `target`; `None` when no converter is registered.
    #[must_use]
    pub fn convert(&self, raw: &str, target: TypeKey) -> Option<Result<HandlerValue, String>> {
        self.converters
            .get(&target.id())
            .map(|(_, convert)| convert(raw))
    }

    /// Returns the value standing for "absent" for optional targets.
    #[must_use]
    pub fn absent_value(&self, target: TypeKey) -> Option<HandlerValue> {
        self.absent.get(&target.id()).cloned()
    }

    /// Returns the number of registered converters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl fmt::Debug for ConversionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut targets: Vec<_> = self.converters.values().map(|(key, _)| key.name()).collect();
        targets.sort_unstable();
        f.debug_struct("ConversionService")
            .field("targets", &targets)
            .finish()
    }
}

/// Binder for one target object or parameter.
///
/// Carries the name of the thing being bound, which ends up in error
/// messages, and the conversion service to use.
#[derive(Debug, Clone)]
pub struct WebDataBinder {
    object_name: String,
    conversion: Arc<ConversionService>,
}

impl WebDataBinder {
    /// Creates a binder.
    pub fn new(object_name: impl Into<String>, conversion: Arc<ConversionService>) -> Self {
        Self {
            object_name: object_name.into(),
            conversion,
        }
    }

    /// Returns the bound object's name.
    #[must_use]
    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    /// Returns `true` if the binder can produce `target`.
    #[must_use]
    pub fn can_convert(&self, target: TypeKey) -> bool {
        self.conversion.can_convert(target)
    }

    /// Converts a raw string to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] when no converter exists for `target` or
    /// the converter rejects the input.
    pub fn convert(&self, raw: &str, target: TypeKey) -> Result<HandlerValue, ResolutionError> {
        self.convert_from(RequestSource::Other, raw, target)
    }

    /// Converts a raw string read from `source` to `target`.
    ///
    /// # Errors
    ///
    /// Same as [`convert`](Self::convert); errors name `source` and the
    /// binder's object name.
    pub fn convert_from(
        &self,
        source: RequestSource,
        raw: &str,
        target: TypeKey,
    ) -> Result<HandlerValue, ResolutionError> {
        match self.conversion.convert(raw, target) {
            Some(Ok(value)) => Ok(value),
            Some(Err(reason)) => Err(ResolutionError::invalid_type(
                source,
                &self.object_name,
                format!("cannot convert '{raw}' to {target}: {reason}"),
            )),
            None => Err(ResolutionError::binding_failed(
                source,
                &self.object_name,
                format!("no converter registered for {target}"),
            )),
        }
    }

    /// Returns the "absent" value for optional targets.
    #[must_use]
    pub fn absent_value(&self, target: TypeKey) -> Option<HandlerValue> {
        self.conversion.absent_value(target)
    }
}

/// Creates [`WebDataBinder`]s for the current request.
pub trait DataBinderFactory: Send + Sync {
    /// Creates a binder for the named target.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] if the binder cannot be initialised.
    fn create_binder(
        &self,
        request: &NativeRequest,
        object_name: &str,
    ) -> Result<WebDataBinder, ResolutionError>;
}

/// Factory handing out binders backed by one shared [`ConversionService`].
#[derive(Debug, Clone)]
pub struct DefaultBinderFactory {
    conversion: Arc<ConversionService>,
}

impl DefaultBinderFactory {
    /// Creates a factory.
    #[must_use]
    pub fn new(conversion: ConversionService) -> Self {
        Self {
            conversion: Arc::new(conversion),
        }
    }

    /// Returns the shared conversion service.
    #[must_use]
    pub fn conversion_service(&self) -> &ConversionService {
        &self.conversion
    }
}

impl Default for DefaultBinderFactory {
    fn default() -> Self {
        Self::new(ConversionService::with_defaults())
    }
}

impl DataBinderFactory for DefaultBinderFactory {
    fn create_binder(
        &self,
        _request: &NativeRequest,
        object_name: &str,
    ) -> Result<WebDataBinder, ResolutionError> {
        Ok(WebDataBinder::new(object_name, Arc::clone(&self.conversion)))
    }
}
