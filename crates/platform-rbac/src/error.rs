//! Error types for catalog generation
//!
//! A malformed type definition aborts catalog generation outright; no partial
//! catalog is ever produced.

use thiserror::Error;

/// Catalog configuration error.
///
/// Raised while turning extensible type definitions into codenames. Seeding
/// treats every variant as fatal.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Type slug is empty or contains characters outside `[a-z0-9_-]`
    #[error("Invalid resource type slug: {0:?}")]
    InvalidSlug(String),

    /// Two definitions share the same slug
    #[error("Duplicate resource type slug: {0}")]
    DuplicateSlug(String),

    /// A custom action key is malformed
    #[error("Invalid custom action {action:?} on resource type {slug}")]
    InvalidAction {
        /// Type the action belongs to
        slug: String,
        /// Offending action key
        action: String,
    },

    /// A definition or action has an empty label
    #[error("Missing label for {0}")]
    MissingLabel(String),

    /// Type definitions could not be decoded
    #[error("Malformed type definitions: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    /// Get error code for API responses and logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            CatalogError::InvalidSlug(_) => "INVALID_SLUG",
            CatalogError::DuplicateSlug(_) => "DUPLICATE_SLUG",
            CatalogError::InvalidAction { .. } => "INVALID_ACTION",
            CatalogError::MissingLabel(_) => "MISSING_LABEL",
            CatalogError::Malformed(_) => "MALFORMED_DEFINITIONS",
        }
    }
}
