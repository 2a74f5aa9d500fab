//! Error types for engine administration
//!
//! Permission checks never return these: every failure during a check
//! resolves to deny. They surface only from seeding and administrative
//! mutations.

use platform_rbac::CatalogError;
use thiserror::Error;

/// Errors returned by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Backing store could not be reached
    #[error("Repository unavailable: {0}")]
    Unavailable(String),

    /// Write conflicted with existing data
    #[error("Repository conflict: {0}")]
    Conflict(String),

    /// Referenced record does not exist
    #[error("Record not found: {0}")]
    NotFound(String),
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Engine error types.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Malformed type definition; seeding aborted
    #[error("Configuration error: {0}")]
    Configuration(#[from] CatalogError),

    /// Storage failure during an administrative operation
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Referenced actor or role does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation not permitted on a protected role
    #[error("Role is protected: {0}")]
    ProtectedRole(String),

    /// Invalid engine configuration value
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },
}

/// Result type for engine operations.
pub type AuthzResult<T> = Result<T, AuthzError>;

impl AuthzError {
    /// Check if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            AuthzError::Configuration(_) | AuthzError::Repository(_) | AuthzError::InvalidConfig { .. }
        )
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthzError::Configuration(_) => "CONFIGURATION_ERROR",
            AuthzError::Repository(_) => "REPOSITORY_ERROR",
            AuthzError::NotFound(_) => "NOT_FOUND",
            AuthzError::ProtectedRole(_) => "PROTECTED_ROLE",
            AuthzError::InvalidConfig { .. } => "INVALID_CONFIG",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_converts() {
        let err: AuthzError = CatalogError::InvalidSlug("Bad".to_string()).into();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
        assert!(err.is_server_error());
    }

    #[test]
    fn test_protected_role_is_client_error() {
        let err = AuthzError::ProtectedRole("Administrator".to_string());
        assert!(!err.is_server_error());
        assert_eq!(err.to_string(), "Role is protected: Administrator");
    }
}
