//! Shared per-request state.
//!
//! A [`ModelContainer`] is created by whoever dispatches a request and lent
//! mutably to every resolver of one invocation. Resolvers record side effects
//! in it (model attributes, a switch to the redirect model, a completed
//! session) and the caller inspects it once the handler returns.

use crate::HandlerValue;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An ordered, shareable map of model attributes.
///
/// Clones share the same attributes, so a `ModelMap` handed to a handler as
/// an argument writes into the container it was taken from.
///
/// # Example
///
/// ```
/// use heron_core::{HandlerValue, ModelMap};
///
/// let model = ModelMap::new();
/// let handle = model.clone();
/// handle.add_attribute("user", HandlerValue::new("alice".to_string()));
///
/// assert!(model.contains("user"));
/// assert_eq!(model.names(), vec!["user"]);
/// ```
#[derive(Clone, Default)]
pub struct ModelMap {
    attributes: Arc<Mutex<IndexMap<String, HandlerValue>>>,
}

impl ModelMap {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an attribute.
    pub fn add_attribute(&self, name: impl Into<String>, value: HandlerValue) {
        self.attributes.lock().insert(name.into(), value);
    }

    /// Adds an attribute unless one with that name already exists.
    pub fn add_if_absent(&self, name: impl Into<String>, value: HandlerValue) {
        self.attributes.lock().entry(name.into()).or_insert(value);
    }

    /// Returns an attribute by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<HandlerValue> {
        self.attributes.lock().get(name).cloned()
    }

    /// Removes an attribute.
    pub fn remove(&self, name: &str) -> Option<HandlerValue> {
        self.attributes.lock().shift_remove(name)
    }

    /// Returns `true` if the attribute exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.lock().contains_key(name)
    }

    /// Returns attribute names in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.attributes.lock().keys().cloned().collect()
    }

    /// Returns the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.lock().len()
    }

    /// Returns `true` if there are no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.lock().is_empty()
    }

    /// Copies all attributes of `other` into this model.
    pub fn merge(&self, other: &ModelMap) {
        if Arc::ptr_eq(&self.attributes, &other.attributes) {
            return;
        }
        let source = other.attributes.lock().clone();
        self.attributes.lock().extend(source);
    }

    /// Returns `true` if both handles share the same attributes.
    #[must_use]
    pub fn same_as(&self, other: &ModelMap) -> bool {
        Arc::ptr_eq(&self.attributes, &other.attributes)
    }
}

impl fmt::Debug for ModelMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.attributes.lock().iter()).finish()
    }
}

/// Attributes for a redirect target.
///
/// Plain attributes end up in the redirect URL; flash attributes survive the
/// redirect in session storage.
#[derive(Clone, Default)]
pub struct RedirectAttributes {
    attributes: ModelMap,
    flash: ModelMap,
}

impl RedirectAttributes {
    /// Creates empty redirect attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a URL attribute.
    pub fn add_attribute(&self, name: impl Into<String>, value: HandlerValue) {
        self.attributes.add_attribute(name, value);
    }

    /// Adds a flash attribute.
    pub fn add_flash_attribute(&self, name: impl Into<String>, value: HandlerValue) {
        self.flash.add_attribute(name, value);
    }

    /// Returns the URL attributes.
    #[must_use]
    pub fn attributes(&self) -> &ModelMap {
        &self.attributes
    }

    /// Returns the flash attributes.
    #[must_use]
    pub fn flash_attributes(&self) -> &ModelMap {
        &self.flash
    }
}

impl fmt::Debug for RedirectAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedirectAttributes")
            .field("attributes", &self.attributes)
            .field("flash", &self.flash)
            .finish()
    }
}

/// Handle a handler uses to signal that its session work is done.
#[derive(Debug, Clone, Default)]
pub struct SessionStatus {
    complete: Arc<AtomicBool>,
}

impl SessionStatus {
    /// Creates an incomplete status.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks session processing as complete.
    pub fn set_complete(&self) {
        self.complete.store(true, Ordering::Release);
    }

    /// Returns `true` once [`set_complete`](Self::set_complete) was called.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }
}

/// Per-request accumulator shared by all resolvers of one invocation.
///
/// # Example
///
/// ```
/// use heron_core::{HandlerValue, ModelContainer, ModelMap};
///
/// let mut container = ModelContainer::new();
/// container.add_attribute("count", HandlerValue::new(3_u32));
///
/// // Switching to a redirect hides the default model.
/// container.set_redirect_model_scenario(true);
/// container.set_redirect_model(ModelMap::new());
/// assert!(!container.model().contains("count"));
/// ```
#[derive(Debug, Default)]
pub struct ModelContainer {
    default_model: ModelMap,
    redirect_model: Option<ModelMap>,
    redirect_model_scenario: bool,
    ignore_default_model_on_redirect: bool,
    view_name: Option<String>,
    request_handled: bool,
    session_status: SessionStatus,
}

impl ModelContainer {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the model in effect: the default model, or the redirect model
    /// once a redirect scenario has been entered.
    #[must_use]
    pub fn model(&self) -> ModelMap {
        if self.use_default_model() {
            return self.default_model.clone();
        }
        self.redirect_model.clone().unwrap_or_default()
    }

    /// Returns the model in effect for writing.
    ///
    /// Same as [`model`](Self::model), except that a redirect scenario
    /// without a redirect model installs an empty one first, so writes
    /// through the returned map stay attached to the container.
    pub fn model_mut(&mut self) -> ModelMap {
        if self.use_default_model() {
            return self.default_model.clone();
        }
        self.redirect_model.get_or_insert_with(ModelMap::new).clone()
    }

    fn use_default_model(&self) -> bool {
        !self.redirect_model_scenario
            || (self.redirect_model.is_none() && !self.ignore_default_model_on_redirect)
    }

    /// Returns the default model regardless of redirect state.
    #[must_use]
    pub fn default_model(&self) -> &ModelMap {
        &self.default_model
    }

    /// Installs a model to use in the redirect scenario.
    pub fn set_redirect_model(&mut self, model: ModelMap) {
        self.redirect_model = Some(model);
    }

    /// Signals that the handler is going to redirect.
    pub fn set_redirect_model_scenario(&mut self, redirect: bool) {
        self.redirect_model_scenario = redirect;
    }

    /// When set, a redirect never falls back to the default model.
    pub fn set_ignore_default_model_on_redirect(&mut self, ignore: bool) {
        self.ignore_default_model_on_redirect = ignore;
    }

    /// Adds an attribute to the model in effect.
    pub fn add_attribute(&mut self, name: impl Into<String>, value: HandlerValue) {
        self.model_mut().add_attribute(name, value);
    }

    /// Returns an attribute of the model in effect.
    #[must_use]
    pub fn get_attribute(&self, name: &str) -> Option<HandlerValue> {
        self.model().get(name)
    }

    /// Sets the logical view name.
    pub fn set_view_name(&mut self, view_name: impl Into<String>) {
        self.view_name = Some(view_name.into());
    }

    /// Returns the logical view name.
    #[must_use]
    pub fn view_name(&self) -> Option<&str> {
        self.view_name.as_deref()
    }

    /// Marks the request as fully handled (no view rendering needed).
    pub fn set_request_handled(&mut self, handled: bool) {
        self.request_handled = handled;
    }

    /// Returns `true` if the request was fully handled.
    #[must_use]
    pub fn is_request_handled(&self) -> bool {
        self.request_handled
    }

    /// Returns the session status handle for this request.
    #[must_use]
    pub fn session_status(&self) -> &SessionStatus {
        &self.session_status
    }
}
