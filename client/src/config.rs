//! Store configuration.

use basket_engine::{LEGACY_CART_KEYS, LOCAL_CART_KEY};
use std::env;

/// Default address of the remote cart service.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Cart store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Base URL of the remote cart service
    pub api_url: String,
    /// Storage key holding the anonymous cart
    pub cart_key: String,
    /// Keys from older cart formats, purged on every load
    pub legacy_keys: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            cart_key: LOCAL_CART_KEY.to_string(),
            legacy_keys: LEGACY_CART_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables (and `.env`, if present).
    ///
    /// - `BASKET_API_URL`: remote cart service base URL
    /// - `BASKET_CART_KEY`: storage key for the anonymous cart
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration through a variable lookup function.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_url = var("BASKET_API_URL").unwrap_or(defaults.api_url);
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiUrl(api_url));
        }

        let cart_key = var("BASKET_CART_KEY").unwrap_or(defaults.cart_key);
        if cart_key.trim().is_empty() {
            return Err(ConfigError::EmptyCartKey);
        }

        // A legacy key equal to the live key would wipe the cart on load.
        let legacy_keys = defaults
            .legacy_keys
            .into_iter()
            .filter(|k| *k != cart_key)
            .collect();

        Ok(Self {
            api_url,
            cart_key,
            legacy_keys,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("BASKET_API_URL must be an http(s) URL, got '{0}'")]
    InvalidApiUrl(String),

    #[error("BASKET_CART_KEY must not be empty")]
    EmptyCartKey,
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
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = StoreConfig::from_vars(lookup(&[])).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.cart_key, "cart");
        assert_eq!(config.legacy_keys, vec!["cartItems".to_string()]);
    }

    #[test]
    fn overrides() {
        let config = StoreConfig::from_vars(lookup(&[
            ("BASKET_API_URL", "https://api.example.com"),
            ("BASKET_CART_KEY", "cartItems"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.cart_key, "cartItems");
        assert!(config.legacy_keys.is_empty());
    }

    #[test]
    fn invalid_values() {
        assert_eq!(
            StoreConfig::from_vars(lookup(&[("BASKET_API_URL", "localhost")])),
            Err(ConfigError::InvalidApiUrl("localhost".into()))
        );
        assert_eq!(
            StoreConfig::from_vars(lookup(&[("BASKET_CART_KEY", " ")])),
            Err(ConfigError::EmptyCartKey)
        );
    }
}
