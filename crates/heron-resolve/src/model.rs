//! Resolvers for framework-provided objects.
//!
//! These resolvers never read request data; they hand out objects owned by
//! the per-request [`ModelContainer`] or the request itself.

use crate::ArgumentResolver;
use heron_core::{
    DataBinderFactory, HandlerValue, MethodParameter, ModelContainer, ModelMap, NativeRequest,
    RedirectAttributes, ResolutionError, SessionStatus,
};

/// Resolves [`ModelMap`] parameters to the model in effect.
///
/// The map shares storage with the container, so attributes the handler adds
/// are visible to the caller after the invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelContainerResolver;

impl ArgumentResolver for ModelContainerResolver {
    fn supports_parameter(&self, parameter: &MethodParameter) -> bool {
        parameter.is::<ModelMap>()
    }

    fn resolve_argument(
        &self,
        _parameter: &MethodParameter,
        container: &mut ModelContainer,
        _request: &NativeRequest,
        _binder_factory: Option<&dyn DataBinderFactory>,
    ) -> Result<HandlerValue, ResolutionError> {
        Ok(HandlerValue::new(container.model_mut()))
    }
}

/// Resolves [`RedirectAttributes`] parameters.
///
/// Each resolution creates fresh attributes and installs their map as the
/// container's redirect model, which takes over from the default model once
/// the redirect scenario is entered.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedirectAttributesResolver;

impl ArgumentResolver for RedirectAttributesResolver {
    fn supports_parameter(&self, parameter: &MethodParameter) -> bool {
        parameter.is::<RedirectAttributes>()
    }

    fn resolve_argument(
        &self,
        _parameter: &MethodParameter,
        container: &mut ModelContainer,
        _request: &NativeRequest,
        _binder_factory: Option<&dyn DataBinderFactory>,
    ) -> Result<HandlerValue, ResolutionError> {
        let redirect = RedirectAttributes::new();
        container.set_redirect_model(redirect.attributes().clone());
        Ok(HandlerValue::new(redirect))
    }
}

/// Resolves [`SessionStatus`] parameters to the container's status handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStatusResolver;

impl ArgumentResolver for SessionStatusResolver {
    fn supports_parameter(&self, parameter: &MethodParameter) -> bool {
        parameter.is::<SessionStatus>()
    }

    fn resolve_argument(
        &self,
        _parameter: &MethodParameter,
        container: &mut ModelContainer,
        _request: &NativeRequest,
        _binder_factory: Option<&dyn DataBinderFactory>,
    ) -> Result<HandlerValue, ResolutionError> {
        Ok(HandlerValue::new(container.session_status().clone()))
    }
}

/// Resolves [`NativeRequest`] parameters to the current request.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestResolver;

impl ArgumentResolver for RequestResolver {
    fn supports_parameter(&self, parameter: &MethodParameter) -> bool {
        parameter.is::<NativeRequest>()
    }

    fn resolve_argument(
        &self,
        _parameter: &MethodParameter,
        _container: &mut ModelContainer,
        request: &NativeRequest,
        _binder_factory: Option<&dyn DataBinderFactory>,
    ) -> Result<HandlerValue, ResolutionError> {
        Ok(HandlerValue::new(request.clone()))
    }
}
