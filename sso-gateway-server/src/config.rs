//! Process configuration.
//!
//! Values are read from an optional `sso-gateway.toml` in the working
//! directory, then from `SSO_GATEWAY__*` environment variables, e.g.
//! `SSO_GATEWAY__ENDPOINT=http://sso:7042`.

use std::net::SocketAddr;
use std::time::Duration;

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "SSO_GATEWAY";
pub const CONFIG_FILE: &str = "sso-gateway";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    /// gRPC endpoint of the `sso.Sso` service.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Server-side deadline per call; `0` disables it.
    #[serde(default)]
    pub request_timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_endpoint() -> String {
    "http://127.0.0.1:7042".to_owned()
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_max_body_bytes() -> usize {
    sso_gateway::DEFAULT_BODY_LIMIT
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl GatewayConfig {
    /// Load from the config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );
        Self::from_builder(builder)
    }

    pub(crate) fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".to_owned()));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_ms > 0).then(|| Duration::from_millis(self.connect_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::from_builder(config::Config::builder()).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.endpoint, "http://127.0.0.1:7042");
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.connect_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.max_body_bytes, 4 * 1024 * 1024);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_overrides() {
        let builder = config::Config::builder()
            .set_override("listen_addr", "0.0.0.0:9000")
            .unwrap()
            .set_override("endpoint", "http://sso:7042")
            .unwrap()
            .set_override("request_timeout_ms", 1500)
            .unwrap()
            .set_override("max_body_bytes", 1024)
            .unwrap();
        let config = GatewayConfig::from_builder(builder).unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.endpoint, "http://sso:7042");
        assert_eq!(config.request_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.max_body_bytes, 1024);
    }

    #[test]
    fn test_rejects_empty_endpoint() {
        let builder = config::Config::builder()
            .set_override("endpoint", "")
            .unwrap();
        let err = GatewayConfig::from_builder(builder).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert_eq!(
            err.to_string(),
            "invalid configuration: endpoint must not be empty"
        );
    }

    #[test]
    fn test_rejects_bad_address() {
        let builder = config::Config::builder()
            .set_override("listen_addr", "not an address")
            .unwrap();
        let err = GatewayConfig::from_builder(builder).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
