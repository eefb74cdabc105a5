//! Relationship-backend configuration.
//!
//! The backend endpoint and preshared key are startup configuration, loaded
//! via the `config` crate from environment variables. They are passed into
//! [`RelationshipClient::connect`](crate::RelationshipClient::connect)
//! explicitly; nothing in this crate holds a hard-coded credential.

use serde::Deserialize;
use std::time::Duration;

/// Connection settings for the relationship backend.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// The backend gRPC endpoint (e.g., "http://localhost:50051").
    pub endpoint: String,

    /// The preshared key used to authenticate with the backend.
    pub preshared_key: String,

    /// Upper bound on a single backend round trip, in seconds.
    /// A check that exceeds this is reported as unavailable, not denied.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout_seconds() -> u64 {
    5
}

impl BackendConfig {
    /// Loads configuration from `AUTHZ__`-prefixed environment variables
    /// (e.g., `AUTHZ__ENDPOINT`, `AUTHZ__PRESHARED_KEY`).
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("AUTHZ")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Returns the per-request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_defaults_when_omitted() {
        let cfg: BackendConfig = serde_json::from_str(
            r#"{"endpoint": "http://localhost:50051", "preshared_key": "testkey"}"#,
        )
        .expect("deserialize");
        assert_eq!(cfg.request_timeout_seconds, 5);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn explicit_timeout_wins() {
        let cfg: BackendConfig = serde_json::from_str(
            r#"{"endpoint": "http://spicedb:50051", "preshared_key": "k", "request_timeout_seconds": 2}"#,
        )
        .expect("deserialize");
        assert_eq!(cfg.request_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn missing_endpoint_is_an_error() {
        let result: Result<BackendConfig, _> =
            serde_json::from_str(r#"{"preshared_key": "k"}"#);
        assert!(result.is_err());
    }
}
