//! Engine configuration.
//!
//! Configuration is loaded from environment variables with defaults suitable
//! for local development.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use platform_rbac::permissions::is_valid_segment;

use crate::error::AuthzError;

/// Configuration for a [`PermissionEngine`](crate::PermissionEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long a flattened permission set stays valid, in seconds.
    pub cache_ttl_secs: u64,

    /// Name of the role seeding keeps in sync with the full catalog.
    pub protected_role_name: String,

    /// Codename category the resource-name resolver falls back to, so that
    /// `deploy` on an unrestricted name checks `{resource_category}.deploy`.
    pub resource_category: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 60,
            protected_role_name: "Administrator".to_string(),
            resource_category: "services".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PERMISSION_CACHE_TTL_SECS`: Cache TTL in seconds (default: 60)
    /// - `PERMISSION_PROTECTED_ROLE`: Protected role name (default: Administrator)
    /// - `PERMISSION_RESOURCE_CATEGORY`: Resource fallback category (default: services)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            cache_ttl_secs: std::env::var("PERMISSION_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.cache_ttl_secs),
            protected_role_name: std::env::var("PERMISSION_PROTECTED_ROLE")
                .unwrap_or(default.protected_role_name),
            resource_category: std::env::var("PERMISSION_RESOURCE_CATEGORY")
                .unwrap_or(default.resource_category),
        }
    }

    /// Set the cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_secs = ttl.as_secs();
        self
    }

    /// Get the cache TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), AuthzError> {
        if self.protected_role_name.trim().is_empty() {
            return Err(AuthzError::InvalidConfig {
                key: "protected_role_name".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if !is_valid_segment(&self.resource_category) {
            return Err(AuthzError::InvalidConfig {
                key: "resource_category".to_string(),
                message: format!("{:?} is not a valid codename category", self.resource_category),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.protected_role_name, "Administrator");
        assert_eq!(config.resource_category, "services");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.protected_role_name = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.resource_category = "services.v2".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_with_cache_ttl() {
        let config = EngineConfig::default().with_cache_ttl(Duration::from_secs(5));
        assert_eq!(config.cache_ttl_secs, 5);
    }

    #[test]
    fn test_config_deserializes() {
        let config: EngineConfig = serde_json::from_str(
            r#"{"cache_ttl_secs": 30, "protected_role_name": "Root", "resource_category": "apps"}"#,
        )
        .unwrap();
        assert_eq!(config.cache_ttl_secs, 30);
        assert_eq!(config.resource_category, "apps");
    }
}
