//! Configuration management for the server.

use std::env;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// PostgreSQL connection URL; carts are kept in memory when absent
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections
    pub max_connections: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration through a variable lookup function.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = var("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let database_url = var("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidMaxConnections)?,
            None => 10,
        };

        Ok(Self {
            host,
            port,
            database_url,
            max_connections,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("DATABASE_MAX_CONNECTIONS must be a positive integer")]
    InvalidMaxConnections,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::from_vars(|_| None).unwrap();
        assert_eq!(config.address(), "0.0.0.0:3000");
        assert_eq!(config.database_url, None);
        assert_eq!(config.max_connections, 10);
    }

    #[test]
    fn overrides_and_errors() {
        let config = Config::from_vars(|name| match name {
            "PORT" => Some("8080".into()),
            "DATABASE_URL" => Some("postgres://localhost/basket".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/basket")
        );

        let err = Config::from_vars(|name| (name == "PORT").then(|| "http".to_string()));
        assert_eq!(err, Err(ConfigError::InvalidPort));

        let config = Config::from_vars(|name| (name == "DATABASE_URL").then(String::new)).unwrap();
        assert_eq!(config.database_url, None);

        for value in ["0", "many"] {
            let err = Config::from_vars(|name| {
                (name == "DATABASE_MAX_CONNECTIONS").then(|| value.to_string())
            });
            assert_eq!(err, Err(ConfigError::InvalidMaxConnections));
        }
    }
}
