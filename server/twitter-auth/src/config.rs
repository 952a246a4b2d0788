use std::env::VarError;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::errors::ExchangeError;

pub const CLIENT_ID_ENV: &str = "TWITTER_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "TWITTER_CLIENT_SECRET";
pub const TOKEN_URL_ENV: &str = "TWITTER_TOKEN_URL";
pub const USER_URL_ENV: &str = "TWITTER_USER_URL";
pub const HOST_ENV: &str = "TWITTER_AUTH_HOST";
pub const PORT_ENV: &str = "TWITTER_AUTH_PORT";

pub const DEFAULT_TOKEN_URL: &str = "https://api.twitter.com/2/oauth2/token";
pub const DEFAULT_USER_URL: &str = "https://api.twitter.com/2/users/me";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} contains invalid unicode")]
    NotUnicode(String),

    #[error("invalid url provided via {key}: {reason}")]
    InvalidUrl { key: String, reason: String },

    #[error("invalid port provided via {key}: '{value}'")]
    InvalidPort { key: String, value: String },
}

/// Confidential client credentials registered with the provider.
///
/// Both halves are optional at load time. A missing value only surfaces when
/// a request needs it, as [`ExchangeError::ServerMisconfigured`].
#[derive(Clone, Debug, Default)]
pub struct ProviderCredentials {
    client_id: Option<String>,
    client_secret: Option<SecretString>,
}

impl ProviderCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::from_parts(Some(client_id.into()), Some(client_secret.into()))
    }

    /// Blank values are treated the same as absent ones.
    pub fn from_parts(client_id: Option<String>, client_secret: Option<String>) -> Self {
        Self {
            client_id: client_id.and_then(non_blank),
            client_secret: client_secret.and_then(non_blank).map(SecretString::from),
        }
    }

    pub fn from_env() -> Self {
        Self::from_parts(
            credential_from_env(CLIENT_ID_ENV),
            credential_from_env(CLIENT_SECRET_ENV),
        )
    }

    pub fn has_client_id(&self) -> bool {
        self.client_id.is_some()
    }

    pub fn has_client_secret(&self) -> bool {
        self.client_secret.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.has_client_id() && self.has_client_secret()
    }

    /// Returns `(client_id, client_secret)` or a server configuration error.
    pub fn resolve(&self) -> Result<(&str, &str), ExchangeError> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => Ok((id.as_str(), secret.expose_secret())),
            _ => Err(ExchangeError::ServerMisconfigured),
        }
    }
}

/// Provider endpoints used for the two outbound calls.
#[derive(Clone, Debug)]
pub struct ProviderEndpoints {
    pub token_url: Url,
    pub user_url: Url,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            token_url: Url::parse(DEFAULT_TOKEN_URL).expect("default token url is valid"),
            user_url: Url::parse(DEFAULT_USER_URL).expect("default user url is valid"),
        }
    }
}

impl ProviderEndpoints {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_raw(
            read_env(TOKEN_URL_ENV)?.as_deref(),
            read_env(USER_URL_ENV)?.as_deref(),
        )
    }

    /// Builds endpoints from optional overrides, falling back to the public API.
    pub fn from_raw(token_url: Option<&str>, user_url: Option<&str>) -> Result<Self, ConfigError> {
        Ok(Self {
            token_url: parse_url(TOKEN_URL_ENV, token_url.unwrap_or(DEFAULT_TOKEN_URL))?,
            user_url: parse_url(USER_URL_ENV, user_url.unwrap_or(DEFAULT_USER_URL))?,
        })
    }
}

/// Process-wide configuration for the exchange handler. Built once at startup
/// and shared read-only between requests.
#[derive(Clone, Debug, Default)]
pub struct ExchangeConfig {
    pub credentials: ProviderCredentials,
    pub endpoints: ProviderEndpoints,
}

impl ExchangeConfig {
    pub fn new(credentials: ProviderCredentials, endpoints: ProviderEndpoints) -> Self {
        Self {
            credentials,
            endpoints,
        }
    }

    /// Reads credentials and endpoint overrides from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            credentials: ProviderCredentials::from_env(),
            endpoints: ProviderEndpoints::from_env()?,
        })
    }

    pub fn with_credentials(mut self, credentials: ProviderCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_endpoints(mut self, endpoints: ProviderEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_raw(read_env(HOST_ENV)?.as_deref(), read_env(PORT_ENV)?.as_deref())
    }

    pub fn from_raw(host: Option<&str>, port: Option<&str>) -> Result<Self, ConfigError> {
        let port = match port {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort {
                key: PORT_ENV.to_string(),
                value: raw.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host: host.unwrap_or(DEFAULT_HOST).to_string(),
            port,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn read_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => Ok(non_blank(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode(key.to_string())),
    }
}

fn credential_from_env(key: &str) -> Option<String> {
    read_env(key).unwrap_or_else(|err| {
        warn!("Ignoring credential: {}", err);
        None
    })
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        key: key.to_string(),
        reason: format!("failed to parse url '{}': {}", raw, e),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::InvalidUrl {
            key: key.to_string(),
            reason: format!("unsupported scheme '{}'", scheme),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_count_as_missing() {
        let credentials = ProviderCredentials::from_parts(Some("  ".to_string()), None);
        assert!(!credentials.has_client_id());
        assert!(!credentials.has_client_secret());
        assert!(matches!(
            credentials.resolve(),
            Err(ExchangeError::ServerMisconfigured)
        ));
    }

    #[test]
    fn either_credential_missing_is_misconfigured() {
        let only_id = ProviderCredentials::from_parts(Some("id".to_string()), None);
        let only_secret = ProviderCredentials::from_parts(None, Some("secret".to_string()));

        assert!(matches!(only_id.resolve(), Err(ExchangeError::ServerMisconfigured)));
        assert!(matches!(only_secret.resolve(), Err(ExchangeError::ServerMisconfigured)));
    }

    #[test]
    fn resolve_returns_both_halves() {
        let credentials = ProviderCredentials::new(" id ", "secret");
        let (id, secret) = credentials.resolve().unwrap();
        assert_eq!(id, "id");
        assert_eq!(secret, "secret");
        assert!(credentials.is_complete());
    }

    #[test]
    fn debug_output_hides_secret() {
        let credentials = ProviderCredentials::new("id", "super-secret-value");
        let printed = format!("{:?}", credentials);
        assert!(!printed.contains("super-secret-value"));
    }

    #[test]
    fn endpoints_default_to_public_api() {
        let endpoints = ProviderEndpoints::from_raw(None, None).unwrap();
        assert_eq!(endpoints.token_url.as_str(), DEFAULT_TOKEN_URL);
        assert_eq!(endpoints.user_url.as_str(), DEFAULT_USER_URL);
    }

    #[test]
    fn endpoint_overrides_are_validated() {
        let endpoints =
            ProviderEndpoints::from_raw(Some("http://127.0.0.1:9000/token"), None).unwrap();
        assert_eq!(endpoints.token_url.as_str(), "http://127.0.0.1:9000/token");

        let err = ProviderEndpoints::from_raw(Some("not a url"), None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));

        let err = ProviderEndpoints::from_raw(None, Some("ftp://example.com/me")).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn server_config_parses_port() {
        let config = ServerConfig::from_raw(Some("0.0.0.0"), Some("8080")).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");

        assert_eq!(ServerConfig::from_raw(None, None).unwrap(), ServerConfig::default());

        let err = ServerConfig::from_raw(None, Some("eighty")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
    }
}
