//! Access-control configuration.
//!
//! Configuration is loaded from environment variables with defaults that
//! match the seeded catalog.

use nukleo_rbac::{Permission, SUPERADMIN_SLUG};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Access-control configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessConfig {
    /// Slug of the role that short-circuits to the master permission.
    pub superadmin_role_slug: String,

    /// Whether `AccessControl::bootstrap` seeds the default catalog.
    pub seed_on_startup: bool,

    /// Log denied checks at debug level.
    pub log_denials: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            superadmin_role_slug: SUPERADMIN_SLUG.to_string(),
            seed_on_startup: true,
            log_denials: false,
        }
    }
}

impl AccessConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RBAC_SUPERADMIN_SLUG`: superadmin role slug (default: superadmin)
    /// - `RBAC_SEED_ON_STARTUP`: seed the catalog at startup (default: true)
    /// - `RBAC_LOG_DENIALS`: log denied checks (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        Self {
            superadmin_role_slug: lookup("RBAC_SUPERADMIN_SLUG")
                .map(|s| s.trim().to_lowercase())
                .unwrap_or(default.superadmin_role_slug),
            seed_on_startup: lookup("RBAC_SEED_ON_STARTUP")
                .and_then(|s| parse_flag(&s))
                .unwrap_or(default.seed_on_startup),
            log_denials: lookup("RBAC_LOG_DENIALS")
                .and_then(|s| parse_flag(&s))
                .unwrap_or(default.log_denials),
        }
    }

    /// The master permission, `admin:*`.
    pub fn master_permission(&self) -> Permission {
        Permission::master()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.superadmin_role_slug.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "RBAC_SUPERADMIN_SLUG".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// `true`/`false` in any case; anything else is rejected so the default applies.
fn parse_flag(s: &str) -> Option<bool> {
    s.trim().to_ascii_lowercase().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AccessConfig::default();
        assert_eq!(config.superadmin_role_slug, "superadmin");
        assert!(config.seed_on_startup);
        assert!(!config.log_denials);
        assert_eq!(config.master_permission().to_string(), "admin:*");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = AccessConfig::from_lookup(lookup_from(&[
            ("RBAC_SUPERADMIN_SLUG", " Root "),
            ("RBAC_SEED_ON_STARTUP", "FALSE"),
            ("RBAC_LOG_DENIALS", "true"),
        ]));

        assert_eq!(config.superadmin_role_slug, "root");
        assert!(!config.seed_on_startup);
        assert!(config.log_denials);
    }

    #[test]
    fn test_unrecognized_flags_keep_defaults() {
        for value in ["no", "off", "0", "yes", ""] {
            let config = AccessConfig::from_lookup(lookup_from(&[
                ("RBAC_SEED_ON_STARTUP", value),
                ("RBAC_LOG_DENIALS", value),
            ]));
            assert!(config.seed_on_startup, "seed_on_startup for {:?}", value);
            assert!(!config.log_denials, "log_denials for {:?}", value);
        }

        let config = AccessConfig::from_lookup(lookup_from(&[
            ("RBAC_SEED_ON_STARTUP", " false "),
            ("RBAC_LOG_DENIALS", "True"),
        ]));
        assert!(!config.seed_on_startup);
        assert!(config.log_denials);
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = AccessConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, AccessConfig::default());
    }

    #[test]
    fn test_validate() {
        let mut config = AccessConfig::default();
        assert!(config.validate().is_ok());

        config.superadmin_role_slug = String::new();
        assert!(config.validate().is_err());
    }
}
