//! Mapping errors.

use thiserror::Error;

/// Error raised while registering URL mappings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// The URL is already mapped to a different handler.
    #[error(
        "cannot map handler '{attempted}' to URL path '{url}': \
         there is already handler '{existing}' mapped"
    )]
    AmbiguousMapping {
        /// The contested URL.
        url: String,
        /// Handler currently mapped.
        existing: String,
        /// Handler that was being registered.
        attempted: String,
    },

    /// The URL does not start with `/` and a leading slash is required.
    #[error("URL path '{url}' for handler '{name}' must start with '/'")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Handler that was being registered.
        name: String,
    },
}

impl MappingError {
    /// Returns the URL the error is about.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::AmbiguousMapping { url, .. } | Self::InvalidUrl { url, .. } => url,
        }
    }
}
