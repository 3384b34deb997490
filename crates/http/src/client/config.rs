//! Client configuration

use super::error::ClientError;
use super::session::DEFAULT_AUTH_ENTRY;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix, e.g. `BAZAAR_BASE_URL`
pub const ENV_PREFIX: &str = "BAZAAR";

/// Marketplace API client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API base URL including the version prefix
    pub base_url: String,

    /// Per-transmission timeout in seconds
    pub timeout_secs: u64,

    /// Where users are sent when their session cannot be renewed
    pub auth_entry: String,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001/v0".to_string(),
            timeout_secs: 10,
            auth_entry: DEFAULT_AUTH_ENTRY.to_string(),
            user_agent: concat!("bazaar-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Load configuration from an optional file, overlaid with
    /// `BAZAAR_`-prefixed environment variables, over the defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value cannot be parsed
    pub fn load(path: Option<&Path>) -> Result<Self, ClientError> {
        let defaults = Self::default();

        let mut builder = config::Config::builder()
            .set_default("base_url", defaults.base_url)
            .and_then(|b| b.set_default("timeout_secs", defaults.timeout_secs))
            .and_then(|b| b.set_default("auth_entry", defaults.auth_entry))
            .and_then(|b| b.set_default("user_agent", defaults.user_agent))
            .map_err(config_error)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(config_error)
    }

    /// Load configuration from environment variables and defaults only
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable cannot be parsed
    pub fn from_env() -> Result<Self, ClientError> {
        Self::load(None)
    }
}

fn config_error(err: config::ConfigError) -> ClientError {
    ClientError::Configuration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:3001/v0");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.auth_entry, "/auth");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("client.toml");
        std::fs::write(
            &path,
            "base_url = \"https://market.example/v0\"\ntimeout_secs = 3\n",
        )
        .unwrap();

        let config = ClientConfig::load(Some(&path)).unwrap();
        assert_eq!(config.base_url, "https://market.example/v0");
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.auth_entry, "/auth");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = ClientConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }
}
