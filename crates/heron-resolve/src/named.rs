//! Resolvers for named request values.
//!
//! Query parameters, path variables and headers are all looked up by the
//! parameter's configured name and converted from strings through the data
//! binder. The three resolvers share their rules and differ only in where
//! the raw values come from.

use crate::ArgumentResolver;
use heron_core::{
    DataBinderFactory, HandlerValue, MethodParameter, ModelContainer, NativeRequest,
    RequestSource, ResolutionError, TypeKey,
};

/// Types every named resolver supports out of the box.
fn default_simple_types() -> Vec<TypeKey> {
    macro_rules! with_option {
        ($($ty:ty),*) => {
            vec![$(TypeKey::of::<$ty>(), TypeKey::of::<Option<$ty>>()),*]
        };
    }
    let mut types = with_option!(String, bool, i32, i64, u16, u32, u64, usize, f64);
    types.push(TypeKey::of::<Vec<String>>());
    types
}

/// Support and conversion rules shared by the named resolvers.
#[derive(Debug, Clone)]
struct NamedValueRules {
    source: RequestSource,
    simple_types: Vec<TypeKey>,
}

impl NamedValueRules {
    fn new(source: RequestSource) -> Self {
        Self {
            source,
            simple_types: default_simple_types(),
        }
    }

    fn add_simple_type<T: 'static>(&mut self) {
        for key in [TypeKey::of::<T>(), TypeKey::of::<Option<T>>()] {
            if !self.simple_types.contains(&key) {
                self.simple_types.push(key);
            }
        }
    }

    fn supports(&self, parameter: &MethodParameter) -> bool {
        parameter.name().is_some() && self.simple_types.contains(&parameter.type_key())
    }

    fn resolve(
        &self,
        parameter: &MethodParameter,
        values: Vec<String>,
        request: &NativeRequest,
        binder_factory: Option<&dyn DataBinderFactory>,
    ) -> Result<HandlerValue, ResolutionError> {
        let name = parameter.name().unwrap_or_default();
        let target = parameter.type_key();

        if target.is::<Vec<String>>() {
            return Ok(HandlerValue::new(values));
        }

        let Some(raw) = values.into_iter().next() else {
            return self.absent(name, target, request, binder_factory);
        };

        if target.is::<String>() {
            return Ok(HandlerValue::new(raw));
        }
        if target.is::<Option<String>>() {
            return Ok(HandlerValue::new(Some(raw)));
        }

        let factory = binder_factory.ok_or_else(|| {
            ResolutionError::binding_failed(
                self.source,
                name,
                format!("no data binder factory configured to convert to {target}"),
            )
        })?;
        factory
            .create_binder(request, name)?
            .convert_from(self.source, &raw, target)
    }

    fn absent(
        &self,
        name: &str,
        target: TypeKey,
        request: &NativeRequest,
        binder_factory: Option<&dyn DataBinderFactory>,
    ) -> Result<HandlerValue, ResolutionError> {
        if target.is::<Option<String>>() {
            return Ok(HandlerValue::new(None::<String>));
        }
        if let Some(factory) = binder_factory {
            if let Some(absent) = factory.create_binder(request, name)?.absent_value(target) {
                return Ok(absent);
            }
        }
        tracing::debug!(source = %self.source, name, "required named value missing");
        Err(ResolutionError::missing(self.source, name))
    }
}

macro_rules! named_resolver {
    ($(#[$meta:meta])* $name:ident, $source:expr, |$request:ident, $key:ident| $lookup:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            rules: NamedValueRules,
        }

        impl $name {
            /// Creates the resolver with the default simple types.
            #[must_use]
            pub fn new() -> Self {
                Self {
                    rules: NamedValueRules::new($source),
                }
            }

            /// Also supports parameters of type `T` and `Option<T>`.
            ///
            /// Values are converted through the binder factory, which must be
            /// able to convert to `T`.
            #[must_use]
            pub fn with_simple_type<T: 'static>(mut self) -> Self {
                self.rules.add_simple_type::<T>();
                self
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl ArgumentResolver for $name {
            fn supports_parameter(&self, parameter: &MethodParameter) -> bool {
                self.rules.supports(parameter)
            }

            fn resolve_argument(
                &self,
                parameter: &MethodParameter,
                _container: &mut ModelContainer,
                request: &NativeRequest,
                binder_factory: Option<&dyn DataBinderFactory>,
            ) -> Result<HandlerValue, ResolutionError> {
                let $request = request;
                let $key = parameter.name().unwrap_or_default();
                let values: Vec<String> = $lookup;
                self.rules.resolve(parameter, values, request, binder_factory)
            }
        }
    };
}

named_resolver!(
    /// Resolves named parameters from the query string.
    ///
    /// `Vec<String>` parameters receive every value of a repeated parameter,
    /// possibly none. `Option` parameters receive `None` when the parameter
    /// is absent; anything else is required.
    RequestParamResolver,
    RequestSource::Query,
    |request, name| request.query_params(name)
);

named_resolver!(
    /// Resolves named parameters from the path variables captured by routing.
    PathVariableResolver,
    RequestSource::Path,
    |request, name| request
        .path_variables()
        .get(name)
        .map(str::to_owned)
        .into_iter()
        .collect()
);

named_resolver!(
    /// Resolves named parameters from request headers.
    ///
    /// Underscores in the parameter name become dashes, so `user_agent`
    /// reads the `user-agent` header. Lookup is case-insensitive.
    RequestHeaderResolver,
    RequestSource::Header,
    |request, name| {
        let header = name.replace('_', "-").to_ascii_lowercase();
        request
            .headers()
            .get_all(header.as_str())
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_owned)
            .collect()
    }
);
