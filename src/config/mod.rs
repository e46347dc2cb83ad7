//! Configuration loaded from the environment and an optional `.env` file.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;

use crate::auth::{
    mask_secret, Authenticator, ClientCredentials, ScopeSet, DEFAULT_AUTH_BASE_URL,
    DEFAULT_TOKEN_LIFETIME_MINUTES,
};
use crate::error::{ApiError, Result};
use crate::vehicle::{VehicleApiClient, Vin, DEFAULT_API_BASE_URL};

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8000/callback";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Prefix accepted in front of every key, e.g. `VOLVO_CLIENT_ID`.
const KEY_PREFIX: &str = "VOLVO_";

const REQUIRED_KEYS: [&str; 3] = ["CLIENT_ID", "CLIENT_SECRET", "API_KEY"];

/// Client configuration.
///
/// Each key is read as-is first, then with the `VOLVO_` prefix. Empty
/// values count as unset.
#[derive(Clone)]
pub struct Config {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_key: Option<String>,
    pub vin: Option<String>,
    pub redirect_uri: String,
    pub api_base_url: String,
    pub auth_base_url: String,
    pub token_lifetime: Duration,
    pub log_level: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_deref().map(mask_secret),
            )
            .field("api_key", &self.api_key.as_deref().map(mask_secret))
            .field("vin", &self.vin)
            .field("redirect_uri", &self.redirect_uri)
            .field("api_base_url", &self.api_base_url)
            .field("auth_base_url", &self.auth_base_url)
            .field("token_lifetime", &self.token_lifetime)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            api_key: None,
            vin: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            token_lifetime: Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Load from environment variables (`CLIENT_ID`, `CLIENT_SECRET`, ...).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .or_else(|| lookup(&format!("{KEY_PREFIX}{key}")))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let token_lifetime = match get("ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(raw) => match raw
                .parse::<i64>()
                .ok()
                .filter(|minutes| *minutes > 0)
                .and_then(Duration::try_minutes)
            {
                Some(lifetime) => lifetime,
                None => {
                    tracing::warn!(value = %raw, "ignoring invalid ACCESS_TOKEN_EXPIRE_MINUTES");
                    defaults.token_lifetime
                }
            },
            None => defaults.token_lifetime,
        };

        Self {
            client_id: get("CLIENT_ID"),
            client_secret: get("CLIENT_SECRET"),
            api_key: get("API_KEY"),
            vin: get("VIN"),
            redirect_uri: get("REDIRECT_URI").unwrap_or(defaults.redirect_uri),
            api_base_url: get("API_BASE_URL").unwrap_or(defaults.api_base_url),
            auth_base_url: get("AUTH_BASE_URL").unwrap_or(defaults.auth_base_url),
            token_lifetime,
            log_level: get("LOG_LEVEL")
                .map(|level| level.to_ascii_lowercase())
                .unwrap_or(defaults.log_level),
        }
    }

    /// Required keys that are not set.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let values = [&self.client_id, &self.client_secret, &self.api_key];
        REQUIRED_KEYS
            .iter()
            .zip(values)
            .filter(|(_, value)| value.is_none())
            .map(|(key, _)| *key)
            .collect()
    }

    pub fn credentials(&self) -> Result<ClientCredentials> {
        match (&self.client_id, &self.client_secret, &self.api_key) {
            (Some(id), Some(secret), Some(key)) => {
                Ok(ClientCredentials::new(id.clone(), secret.clone(), key.clone()))
            }
            _ => Err(ApiError::Configuration(format!(
                "missing required configuration: {}",
                self.missing_fields().join(", ")
            ))),
        }
    }

    pub fn require_vin(&self) -> Result<Vin> {
        self.vin
            .as_deref()
            .map(Vin::from)
            .ok_or_else(|| ApiError::Configuration("missing required configuration: VIN".into()))
    }

    /// Authenticator for the configured credentials and endpoints.
    pub fn authenticator(&self, scopes: ScopeSet) -> Result<Authenticator> {
        Ok(
            Authenticator::new(self.credentials()?, scopes, self.redirect_uri.clone())
                .with_auth_base_url(&self.auth_base_url)
                .with_default_token_lifetime(self.token_lifetime),
        )
    }

    pub fn vehicle_client(&self, auth: Arc<Authenticator>) -> VehicleApiClient {
        VehicleApiClient::from_authenticator(auth).with_base_url(self.api_base_url.clone())
    }
}
