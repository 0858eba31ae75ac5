//! Configuration management for the storefront client.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::environment::Endpoints;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use storefront_runtime::StoreConfig;
use thiserror::Error;

/// Invalid configuration values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `STOREFRONT_API_URL` is empty
    #[error("STOREFRONT_API_URL must not be empty")]
    EmptyApiUrl,

    /// `STOREFRONT_API_URL` is not an http(s) URL
    #[error("STOREFRONT_API_URL must start with http:// or https://, got {0:?}")]
    UnsupportedScheme(String),

    /// A backend path does not start with `/`
    #[error("{name} must start with '/', got {value:?}")]
    RelativePath {
        /// Variable name
        name: &'static str,
        /// Offending value
        value: String,
    },

    /// `STOREFRONT_BROADCAST_CAPACITY` is zero
    #[error("STOREFRONT_BROADCAST_CAPACITY must be at least 1")]
    ZeroBroadcastCapacity,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection
    pub api: ApiConfig,
    /// Store and notification behaviour
    pub store: StoreSettings,
    /// Persisted state handed back at startup
    pub state_file: Option<PathBuf>,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
}

/// Backend connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every path is joined onto
    pub url: String,
    /// Bearer token, if the backend requires one
    pub token: Option<String>,
    /// Cart content resource
    pub cart_path: String,
    /// Payment settlements resource
    pub settlements_path: String,
    /// Product catalogue resource
    pub products_path: String,
}

/// Store and notification behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Seconds a notification stays visible (0 = until hidden)
    pub notification_ttl_secs: u64,
    /// Action broadcast buffer per observer
    pub broadcast_capacity: usize,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api: ApiConfig {
                url: lookup("STOREFRONT_API_URL").unwrap_or_else(|| "http://localhost/api/4.0".to_string()),
                token: lookup("STOREFRONT_API_TOKEN").filter(|token| !token.is_empty()),
                cart_path: lookup("STOREFRONT_CART_PATH").unwrap_or_else(|| "/sra_cart_content/".to_string()),
                settlements_path: lookup("STOREFRONT_SETTLEMENTS_PATH")
                    .unwrap_or_else(|| "/sra_settlements".to_string()),
                products_path: lookup("STOREFRONT_PRODUCTS_PATH").unwrap_or_else(|| "/sra_products".to_string()),
            },
            store: StoreSettings {
                notification_ttl_secs: lookup("STOREFRONT_NOTIFICATION_TTL_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(4),
                broadcast_capacity: lookup("STOREFRONT_BROADCAST_CAPACITY")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(256),
                shutdown_timeout_secs: lookup("STOREFRONT_SHUTDOWN_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            },
            state_file: lookup("STOREFRONT_STATE_FILE")
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Check values that would only fail later, at the first request
    ///
    /// # Errors
    ///
    /// The first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api.url.trim();
        if url.is_empty() {
            return Err(ConfigError::EmptyApiUrl);
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::UnsupportedScheme(url.to_string()));
        }

        for (name, value) in [
            ("STOREFRONT_CART_PATH", &self.api.cart_path),
            ("STOREFRONT_SETTLEMENTS_PATH", &self.api.settlements_path),
            ("STOREFRONT_PRODUCTS_PATH", &self.api.products_path),
        ] {
            if !value.starts_with('/') {
                return Err(ConfigError::RelativePath {
                    name,
                    value: value.clone(),
                });
            }
        }

        if self.store.broadcast_capacity == 0 {
            return Err(ConfigError::ZeroBroadcastCapacity);
        }

        Ok(())
    }

    /// Backend paths for the environment
    #[must_use]
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            cart: self.api.cart_path.clone(),
            settlements: self.api.settlements_path.clone(),
            products: self.api.products_path.clone(),
            ..Endpoints::default()
        }
    }

    /// Notification lifetime; `None` when auto-hide is disabled
    #[must_use]
    pub const fn notification_ttl(&self) -> Option<Duration> {
        match self.store.notification_ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Runtime settings for the store
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::default()
            .with_broadcast_capacity(self.store.broadcast_capacity)
            .with_shutdown_timeout(Duration::from_secs(self.store.shutdown_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_the_stock_backend() {
        let config = config_from(&[]);

        assert_eq!(config.api.url, "http://localhost/api/4.0");
        assert_eq!(config.api.token, None);
        assert_eq!(config.endpoints(), Endpoints::default());
        assert_eq!(config.notification_ttl(), Some(Duration::from_secs(4)));
        assert_eq!(config.store.broadcast_capacity, 256);
        assert_eq!(config.state_file, None);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn overrides_and_unparsable_numbers() {
        let config = config_from(&[
            ("STOREFRONT_API_URL", "https://shop.example/api/4.0"),
            ("STOREFRONT_API_TOKEN", "abc"),
            ("STOREFRONT_NOTIFICATION_TTL_SECS", "0"),
            ("STOREFRONT_BROADCAST_CAPACITY", "lots"),
            ("STOREFRONT_STATE_FILE", "/tmp/state.json"),
        ]);

        assert_eq!(config.api.token.as_deref(), Some("abc"));
        assert_eq!(config.notification_ttl(), None);
        assert_eq!(config.store.broadcast_capacity, 256);
        assert_eq!(config.state_file, Some(PathBuf::from("/tmp/state.json")));
        assert_eq!(config.store_config().broadcast_capacity, 256);
    }

    #[test]
    fn products_path_overrides_only_the_catalogue() {
        let config = config_from(&[("STOREFRONT_PRODUCTS_PATH", "/v2/products")]);
        let endpoints = config.endpoints();

        assert_eq!(endpoints.product("12"), "/v2/products/12");
        assert_eq!(endpoints.product_options, Endpoints::default().product_options);
        assert_eq!(
            config_from(&[("STOREFRONT_PRODUCTS_PATH", "products")]).validate(),
            Err(ConfigError::RelativePath {
                name: "STOREFRONT_PRODUCTS_PATH",
                value: "products".to_string(),
            })
        );
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert_eq!(
            config_from(&[("STOREFRONT_API_URL", " ")]).validate(),
            Err(ConfigError::EmptyApiUrl)
        );
        assert!(matches!(
            config_from(&[("STOREFRONT_API_URL", "ftp://shop")]).validate(),
            Err(ConfigError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            config_from(&[("STOREFRONT_CART_PATH", "cart")]).validate(),
            Err(ConfigError::RelativePath {
                name: "STOREFRONT_CART_PATH",
                ..
            })
        ));
        assert_eq!(
            config_from(&[("STOREFRONT_BROADCAST_CAPACITY", "0")]).validate(),
            Err(ConfigError::ZeroBroadcastCapacity)
        );
    }
}
