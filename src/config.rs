//! Server configuration with defaults.

use crate::storage::ReclaimerConfig;
use crate::{DEFAULT_HOST, DEFAULT_PORT};
use std::time::Duration;

/// Configuration for a TideKV server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Sweep settings given to every database's reclaimer
    pub reclaimer: ReclaimerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            reclaimer: ReclaimerConfig::default(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the time between expiry sweeps
    pub fn reclaim_interval(mut self, interval: Duration) -> Self {
        self.config.reclaimer.interval = interval;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.reclaimer.interval, Duration::from_millis(500));
    }

    #[test]
    fn test_builder_overrides() {
        let config = Config::builder()
            .host("127.0.0.1")
            .port(9000)
            .reclaim_interval(Duration::from_millis(50))
            .build();

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.reclaimer.interval, Duration::from_millis(50));
    }
}
