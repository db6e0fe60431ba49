//! Client configuration parsed from environment variables.

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Server used when `CHAT_WIZARD_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
/// Whole-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
/// Connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Free chat endpoint.
pub const CHAT_PATH: &str = "/send_message";
/// Appointment wizard step endpoint.
pub const STEP_PATH: &str = "/appointment_step";
/// Open slots endpoint.
pub const AVAILABILITY_PATH: &str = "/available_slots";

/// Configuration error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid base URL {0:?}: expected an http:// or https:// URL with a host")]
    InvalidBaseUrl(String),
    #[error("Invalid value {value:?} for {var}: expected whole seconds")]
    InvalidNumber { var: &'static str, value: String },
}

/// Endpoint paths relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Path of the free chat endpoint.
    pub chat: String,
    /// Path of the appointment step endpoint.
    pub step: String,
    /// Path of the availability endpoint.
    pub availability: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            chat: CHAT_PATH.to_string(),
            step: STEP_PATH.to_string(),
            availability: AVAILABILITY_PATH.to_string(),
        }
    }
}

/// HTTP timeouts. An expired timeout is an ordinary transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Limit on a whole request, from connect to the last body byte.
    pub request: Duration,
    /// Limit on establishing the connection.
    pub connect: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

/// Where and how the transport reaches the chat server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: Url,
    /// Endpoint paths, joined onto the base URL.
    pub endpoints: Endpoints,
    /// HTTP client timeouts.
    pub timeouts: Timeouts,
}

impl ClientConfig {
    /// Config for `base_url` with default endpoints and timeouts.
    ///
    /// # Errors
    /// Returns an error if the URL is not http(s).
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            endpoints: Endpoints::default(),
            timeouts: Timeouts::default(),
        })
    }

    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `CHAT_WIZARD_BASE_URL`: default `http://127.0.0.1:5000`
    /// - `CHAT_WIZARD_REQUEST_TIMEOUT_SECS`: default 120
    /// - `CHAT_WIZARD_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("CHAT_WIZARD_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(&base_url)?;
        config.timeouts = Timeouts {
            request: parse_secs(
                &lookup,
                "CHAT_WIZARD_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            connect: parse_secs(
                &lookup,
                "CHAT_WIZARD_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?,
        };
        Ok(config)
    }

    /// Replace the base URL.
    ///
    /// # Errors
    /// Returns an error if the URL is not http(s).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = normalize_base_url(base_url)?;
        Ok(self)
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Absolute URL for an endpoint path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidBaseUrl(raw.to_string());
    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    let usable = matches!(url.scheme(), "http" | "https")
        && url.host_str().is_some_and(|host| !host.is_empty())
        && url.query().is_none()
        && url.fragment().is_none();
    if usable { Ok(url) } else { Err(invalid()) }
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u64,
) -> Result<Duration, ConfigError> {
    match lookup(var) {
        None => Ok(Duration::from_secs(default)),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.timeouts, Timeouts::default());
        assert_eq!(config.url(CHAT_PATH), "http://127.0.0.1:5000/send_message");
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CHAT_WIZARD_BASE_URL", "https://care.example.com/api/"),
            ("CHAT_WIZARD_REQUEST_TIMEOUT_SECS", "30"),
            ("CHAT_WIZARD_CONNECT_TIMEOUT_SECS", " 3 "),
        ]))
        .unwrap();
        assert_eq!(config.base_url(), "https://care.example.com/api");
        assert_eq!(
            config.url(AVAILABILITY_PATH),
            "https://care.example.com/api/available_slots"
        );
        assert_eq!(config.timeouts.request, Duration::from_secs(30));
        assert_eq!(config.timeouts.connect, Duration::from_secs(3));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert_eq!(
            ClientConfig::from_lookup(lookup(&[("CHAT_WIZARD_BASE_URL", "localhost:5000")])),
            Err(ConfigError::InvalidBaseUrl("localhost:5000".into()))
        );
        assert_eq!(
            ClientConfig::from_lookup(lookup(&[("CHAT_WIZARD_REQUEST_TIMEOUT_SECS", "soon")])),
            Err(ConfigError::InvalidNumber {
                var: "CHAT_WIZARD_REQUEST_TIMEOUT_SECS",
                value: "soon".into()
            })
        );
        assert!(ClientConfig::new("http://").is_err());
    }

    #[test]
    fn test_rejects_unparseable_urls_at_startup() {
        for raw in [
            "http://exa mple.com",
            "ftp://files.example.com",
            "https://example.com/api?x=1",
            "not a url",
        ] {
            assert_eq!(
                ClientConfig::new(raw),
                Err(ConfigError::InvalidBaseUrl(raw.to_string())),
                "{raw}"
            );
        }

        let config = ClientConfig::new(" https://Example.COM:8443/ ").unwrap();
        assert_eq!(config.base_url(), "https://example.com:8443");
        assert_eq!(config.url(STEP_PATH), "https://example.com:8443/appointment_step");
    }
}
