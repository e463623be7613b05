//! Centralized server configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables, with `__` as the nesting separator
//! (e.g. `NATS__URL`).

use serde::Deserialize;

/// Server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// NATS status-channel configuration.
    #[serde(default)]
    pub nats: NatsConfig,
}

/// NATS connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL for publishing status events.
    #[serde(default = "default_nats_url")]
    pub url: String,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_nats_url() -> String {
    "nats://127.0.0.1:4222".to_string()
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: default_nats_url(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a provided value fails to parse.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nats_config_has_a_local_default() {
        let config = NatsConfig::default();
        assert_eq!(config.url, "nats://127.0.0.1:4222");
    }

    #[test]
    fn listen_addr_defaults_to_localhost() {
        assert_eq!(default_listen_addr(), "127.0.0.1:3000");
    }
}
