//! # Heron Mapping
//!
//! URL detection for the Heron handler dispatch framework.
//!
//! A [`UrlHandlerMapping`] walks the names of a
//! [`NameLookup`](heron_core::NameLookup), asks a [`UrlStrategy`] which URL
//! paths each name serves, and records `url -> name`. The dispatcher later
//! looks up the name for a request path and fetches the handler by name.
//!
//! | Strategy | URLs of a name |
//! |----------|----------------|
//! | [`UrlStrategy::BeanName`] | The name and its aliases, when they start with `/` |
//! | [`UrlStrategy::Declared`] | The URLs declared at registration |
//! | [`UrlStrategy::Custom`] | Whatever a [`DetermineUrls`] implementation says |

#![doc(html_root_url = "https://docs.rs/heron-mapping/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod mapping;
mod pattern;
mod strategy;

pub use error::MappingError;
pub use mapping::UrlHandlerMapping;
pub use pattern::{is_pattern, PathPattern, Specificity};
pub use strategy::{BeanNameUrls, DeclaredUrls, DetermineUrls, UrlStrategy};
