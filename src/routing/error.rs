//! Terminal routing outcomes
//!
//! These are not failures of the service; each maps to a fixed HTTP status.

use axum::http::StatusCode;
use thiserror::Error;

use crate::models::CategoryId;

/// Non-200 terminal outcome of route resolution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// Unknown slug or alias in sequence-route position
    #[error("category not found: {slug}")]
    CategoryNotFound { slug: String },

    /// Category resolved but no attached item holds the sequence
    #[error("no item with sequence {sequence} in category {category}")]
    ItemNotFoundForSequence { category: CategoryId, sequence: u64 },

    /// Path matches a retired structure
    #[error("retired path: {message}")]
    RetiredPath {
        pattern: Option<String>,
        message: String,
    },

    /// Path matches a legacy redirect rule
    #[error("legacy path, moved to {location}")]
    LegacyPathRedirect { location: String },

    /// Item resolved but was requested at a non-canonical URL
    #[error("non-canonical URL, moved to {location}")]
    CanonicalRedirect { location: String },
}

impl RouteError {
    /// HTTP status for this outcome
    pub fn status(&self) -> StatusCode {
        match self {
            Self::CategoryNotFound { .. } | Self::ItemNotFoundForSequence { .. } => {
                StatusCode::NOT_FOUND
            }
            Self::RetiredPath { .. } => StatusCode::GONE,
            Self::LegacyPathRedirect { .. } | Self::CanonicalRedirect { .. } => {
                StatusCode::MOVED_PERMANENTLY
            }
        }
    }

    /// Redirect target, for redirect outcomes
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::LegacyPathRedirect { location } | Self::CanonicalRedirect { location } => {
                Some(location.as_str())
            }
            _ => None,
        }
    }

    /// Short machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CategoryNotFound { .. } => "category_not_found",
            Self::ItemNotFoundForSequence { .. } => "item_not_found_for_sequence",
            Self::RetiredPath { .. } => "retired_path",
            Self::LegacyPathRedirect { .. } => "legacy_path_redirect",
            Self::CanonicalRedirect { .. } => "canonical_redirect",
        }
    }
}
