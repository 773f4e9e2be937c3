//! Service configuration

use crate::cache::RoleIndexReload;
use crate::error::{AuthzError, Result};
use serde::{Deserialize, Serialize};

/// Authority service configuration
///
/// Environment variables read by [`AuthzConfig::from_env`]:
/// - `AUTHZ_RELOAD_CAPACITY` - pending reload notifications (default: 16)
/// - `AUTHZ_ROLE_INDEX_RELOAD` - `replace` or `accumulate` (default: replace)
/// - `AUTHZ_LOAD_ON_START` - load both caches during `init` (default: true)
/// - `DATABASE_URL` - PostgreSQL connection string (optional)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthzConfig {
    /// Capacity of the reload notification queue
    pub reload_channel_capacity: usize,

    /// Fold policy of the role-authority index
    pub role_index_reload: RoleIndexReload,

    /// Load both caches when the service is initialized
    pub load_on_start: bool,

    /// Backing database, when a PostgreSQL store is used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            reload_channel_capacity: 16,
            role_index_reload: RoleIndexReload::Replace,
            load_on_start: true,
            database_url: None,
        }
    }
}

impl AuthzConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup("AUTHZ_RELOAD_CAPACITY") {
            let capacity: usize = value.trim().parse().map_err(|_| {
                AuthzError::InvalidInput(format!("AUTHZ_RELOAD_CAPACITY: `{}` is not a number", value))
            })?;
            config.reload_channel_capacity = capacity;
        }

        if let Some(value) = lookup("AUTHZ_ROLE_INDEX_RELOAD") {
            config.role_index_reload = value.parse()?;
        }

        if let Some(value) = lookup("AUTHZ_LOAD_ON_START") {
            config.load_on_start = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(AuthzError::InvalidInput(format!(
                        "AUTHZ_LOAD_ON_START: `{}` is not a boolean",
                        value
                    )))
                }
            };
        }

        config.database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.reload_channel_capacity == 0 {
            return Err(AuthzError::InvalidInput(
                "reload channel capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AuthzConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AuthzConfig::default());
        assert_eq!(config.reload_channel_capacity, 16);
        assert_eq!(config.role_index_reload, RoleIndexReload::Replace);
        assert!(config.load_on_start);
    }

    #[test]
    fn test_overrides() {
        let config = AuthzConfig::from_lookup(lookup(&[
            ("AUTHZ_RELOAD_CAPACITY", "4"),
            ("AUTHZ_ROLE_INDEX_RELOAD", "accumulate"),
            ("AUTHZ_LOAD_ON_START", "false"),
            ("DATABASE_URL", "postgresql://localhost/app"),
        ]))
        .unwrap();

        assert_eq!(config.reload_channel_capacity, 4);
        assert_eq!(config.role_index_reload, RoleIndexReload::Accumulate);
        assert!(!config.load_on_start);
        assert_eq!(config.database_url.as_deref(), Some("postgresql://localhost/app"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(AuthzConfig::from_lookup(lookup(&[("AUTHZ_RELOAD_CAPACITY", "many")])).is_err());
        assert!(AuthzConfig::from_lookup(lookup(&[("AUTHZ_RELOAD_CAPACITY", "0")])).is_err());
        assert!(AuthzConfig::from_lookup(lookup(&[("AUTHZ_LOAD_ON_START", "maybe")])).is_err());
        assert!(AuthzConfig::from_lookup(lookup(&[("AUTHZ_ROLE_INDEX_RELOAD", "merge")])).is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: AuthzConfig =
            serde_json::from_str(r#"{"role_index_reload": "accumulate"}"#).unwrap();
        assert_eq!(config.role_index_reload, RoleIndexReload::Accumulate);
        assert_eq!(config.reload_channel_capacity, 16);
    }
}
