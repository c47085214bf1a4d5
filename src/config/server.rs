//! Listener, logging and CORS settings.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `BILLING__SERVER__HOST` | `0.0.0.0` |
//! | `BILLING__SERVER__PORT` | `8080` |
//! | `BILLING__SERVER__ENVIRONMENT` | `development` |
//! | `BILLING__SERVER__LOG_LEVEL` | `info,billing_sync=debug,sqlx=warn` |
//! | `BILLING__SERVER__REQUEST_TIMEOUT_SECS` | `30` |
//! | `BILLING__SERVER__CORS_ORIGINS` | none (comma-separated) |

use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

use super::error::ValidationError;

/// Upper bound for the request timeout. Processor calls must fit inside it.
const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Production switches logs to JSON and tightens secret checks.
    pub environment: Environment,
    /// `EnvFilter` directive, used when `RUST_LOG` is unset.
    pub log_level: String,
    pub request_timeout_secs: u64,
    /// Browser origins allowed to call the session endpoints.
    pub cors_origins: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: Environment::Development,
            log_level: "info,billing_sync=debug,sqlx=warn".to_string(),
            request_timeout_secs: 30,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ValidationError::InvalidBindAddress(addr))
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configured origins, blanks dropped.
    pub fn cors_origins_list(&self) -> Vec<&str> {
        self.cors_origins
            .as_deref()
            .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
            return Err(ValidationError::InvalidTimeout);
        }
        self.socket_addr()?;

        // An origin is scheme://host[:port] with no path.
        for origin in self.cors_origins_list() {
            let valid = origin
                .strip_prefix("https://")
                .or_else(|| origin.strip_prefix("http://"))
                .map_or(false, |rest| !rest.is_empty() && !rest.contains('/'));
            if !valid {
                return Err(ValidationError::InvalidCorsOrigin(origin.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_all_interfaces_in_development() {
        let config = ServerConfig::default();

        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:8080");
        assert!(!config.is_production());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn environment_reads_lowercase_names() {
        let env: Environment = serde_json::from_str(r#""production""#).unwrap();
        assert_eq!(env, Environment::Production);
        assert!(serde_json::from_str::<Environment>(r#""staging""#).is_err());
    }

    #[test]
    fn cors_list_skips_blank_entries() {
        let config = ServerConfig {
            cors_origins: Some("https://app.example.com, ,http://localhost:3000,".to_string()),
            ..Default::default()
        };

        assert_eq!(
            config.cors_origins_list(),
            vec!["https://app.example.com", "http://localhost:3000"]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn cors_origin_with_path_or_no_scheme_is_rejected() {
        for bad in ["app.example.com", "https://app.example.com/billing", "ftp://x"] {
            let config = ServerConfig {
                cors_origins: Some(bad.to_string()),
                ..Default::default()
            };
            assert_eq!(
                config.validate(),
                Err(ValidationError::InvalidCorsOrigin(bad.to_string()))
            );
        }
    }

    #[test]
    fn unparseable_host_fails_validation() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidBindAddress(_))
        ));
    }

    #[test]
    fn port_and_timeout_bounds() {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPort));

        for secs in [0, MAX_REQUEST_TIMEOUT_SECS + 1] {
            let config = ServerConfig {
                request_timeout_secs: secs,
                ..Default::default()
            };
            assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
        }
    }
}
