use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::header::ACCEPT;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use strum::Display;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::credentials::{ClientCredentials, ScopeSet};
use super::error::AuthError;
use super::token::TokenState;
use crate::transport;

pub const DEFAULT_AUTH_BASE_URL: &str = "https://volvoid.eu.volvocars.com";
const AUTHORIZE_PATH: &str = "/as/authorization.oauth2";
const TOKEN_PATH: &str = "/as/token.oauth2";

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME_MINUTES: i64 = 30;

/// Where an authenticator is in the token lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum AuthStatus {
    /// No token has been obtained yet.
    Unauthenticated,
    /// A code exchange or refresh is in flight.
    Authenticating,
    /// Holding an unexpired access token.
    Authenticated,
    /// The access token expired; a refresh token is available.
    Stale,
    /// The refresh token is missing or was rejected. Only a new code
    /// exchange recovers from here.
    AuthFailed,
}

/// Source of a currently valid bearer token.
///
/// [`VehicleApiClient`](crate::vehicle::VehicleApiClient) asks for the token
/// on every request and never caches it.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;
}

/// Build the browser authorization URL for the authorization-code flow.
///
/// Pure function of its inputs: the same arguments always produce the same
/// URL. Parameter values are form-URL-encoded and scopes are space-joined.
///
/// # Example
/// ```
/// use connected_vehicle::auth::{build_authorization_url, ClientCredentials, ScopeSet};
///
/// let creds = ClientCredentials::new("client", "secret", "key");
/// let url = build_authorization_url(
///     "https://auth.example.com/as/authorization.oauth2",
///     &creds,
///     &ScopeSet::new(["openid", "conve:vehicle_relation"]),
///     "http://localhost:8000/callback",
/// )?;
/// assert!(url.as_str().contains("response_type=code"));
/// # Ok::<(), connected_vehicle::auth::AuthError>(())
/// ```
pub fn build_authorization_url(
    authorize_endpoint: &str,
    credentials: &ClientCredentials,
    scopes: &ScopeSet,
    redirect_uri: &str,
) -> Result<Url, AuthError> {
    let scope = scopes.to_param();
    Url::parse_with_params(
        authorize_endpoint,
        &[
            ("response_type", "code"),
            ("client_id", credentials.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
        ],
    )
    .map_err(|err| {
        AuthError::Configuration(format!(
            "invalid authorization endpoint {authorize_endpoint}: {err}"
        ))
    })
}

/// OAuth2 authorization-code authenticator and owner of the token state.
///
/// The authorization code itself is obtained out of band (browser redirect,
/// pasted by the user) and handed to
/// [`exchange_code_for_token`](Self::exchange_code_for_token) as a string.
/// Nothing is retried internally.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use connected_vehicle::auth::{Authenticator, ClientCredentials, ScopeSet};
///
/// # async fn example() -> Result<(), connected_vehicle::auth::AuthError> {
/// let auth = Arc::new(Authenticator::new(
///     ClientCredentials::new("client", "secret", "api-key"),
///     ScopeSet::basic(),
///     "http://localhost:8000/callback",
/// ));
/// println!("Open: {}", auth.authorization_url()?);
/// let token = auth.exchange_code_for_token("code-from-redirect").await?;
/// assert!(token.is_valid());
/// # Ok(())
/// # }
/// ```
pub struct Authenticator {
    client: reqwest::Client,
    credentials: ClientCredentials,
    scopes: ScopeSet,
    redirect_uri: String,
    authorize_url: String,
    token_url: String,
    default_lifetime: Duration,
    refresh_margin: Duration,
    session: Mutex<Session>,
    in_flight: AtomicUsize,
}

#[derive(Debug, Default)]
struct Session {
    token: TokenState,
    failed: bool,
}

impl Authenticator {
    pub fn new(
        credentials: ClientCredentials,
        scopes: ScopeSet,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client: transport::default_client(),
            credentials,
            scopes,
            redirect_uri: redirect_uri.into(),
            authorize_url: format!("{DEFAULT_AUTH_BASE_URL}{AUTHORIZE_PATH}"),
            token_url: format!("{DEFAULT_AUTH_BASE_URL}{TOKEN_PATH}"),
            default_lifetime: Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES),
            refresh_margin: Duration::zero(),
            session: Mutex::new(Session::default()),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Point both OAuth endpoints at another authorization host.
    pub fn with_auth_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        let base = base_url.as_ref().trim_end_matches('/');
        self.authorize_url = format!("{base}{AUTHORIZE_PATH}");
        self.token_url = format!("{base}{TOKEN_PATH}");
        self
    }

    pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = url.into();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_default_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.default_lifetime = lifetime;
        self
    }

    /// Refresh tokens this long before they expire.
    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Seed the authenticator with a token obtained elsewhere.
    pub fn with_token_state(mut self, state: TokenState) -> Self {
        self.session.get_mut().token = state;
        self
    }

    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    pub fn scopes(&self) -> &ScopeSet {
        &self.scopes
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Authorization URL for this client's credentials, scopes and redirect.
    pub fn authorization_url(&self) -> Result<Url, AuthError> {
        build_authorization_url(
            &self.authorize_url,
            &self.credentials,
            &self.scopes,
            &self.redirect_uri,
        )
    }

    /// Exchange a single-use authorization code for a token pair.
    ///
    /// On success the stored state is replaced and returned. A code that was
    /// already used is rejected by the server and surfaces as
    /// [`AuthError::TokenExchangeFailed`].
    pub async fn exchange_code_for_token(&self, code: &str) -> Result<TokenState, AuthError> {
        let _flight = InFlight::enter(&self.in_flight);
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let token = match self.request_token(&form, None).await {
            Ok(token) => token,
            Err(failure) => {
                let err = failure.into_auth_error(Grant::AuthorizationCode);
                warn!(error = %err, "authorization code exchange failed");
                return Err(err);
            }
        };

        let mut session = self.session.lock().await;
        session.token = token.clone();
        session.failed = false;
        info!(expires_at = ?token.expires_at, "authorization code exchanged for token");
        Ok(token)
    }

    /// Exchange the refresh token in `state` for a new access token.
    ///
    /// The stored state is replaced only if the refresh succeeds. If the
    /// stored state already moved past `state` and is still valid, it is
    /// returned without contacting the server, since the refresh token in
    /// `state` may already have been spent.
    pub async fn refresh_token(&self, state: &TokenState) -> Result<TokenState, AuthError> {
        let mut session = self.session.lock().await;
        if session.token.refresh_token != state.refresh_token && session.token.is_valid() {
            debug!("token already refreshed by another caller");
            return Ok(session.token.clone());
        }
        self.refresh_locked(&mut session, state.refresh_token.as_deref())
            .await
    }

    /// Return a valid access token, refreshing first if needed.
    ///
    /// The validity check and the refresh run under one lock, so concurrent
    /// callers that all see a stale token trigger a single refresh.
    /// Without a refresh token this fails with
    /// [`AuthError::NotAuthenticated`] and sends nothing.
    pub async fn ensure_valid_token(&self) -> Result<String, AuthError> {
        let mut session = self.session.lock().await;
        let current = if session.token.is_valid() {
            session.token.access_token.clone()
        } else {
            None
        };

        if let Some(access) = &current {
            if !session.token.needs_refresh(self.refresh_margin) {
                return Ok(access.clone());
            }
        }

        if session.failed || !session.token.has_refresh_token() {
            if let Some(access) = current {
                return Ok(access);
            }
            if session.token.has_access_token() {
                session.failed = true;
            }
            return Err(AuthError::NotAuthenticated);
        }

        let refresh = session.token.refresh_token.clone();
        match self.refresh_locked(&mut session, refresh.as_deref()).await {
            Ok(token) => token.access_token.ok_or(AuthError::NotAuthenticated),
            Err(err) => match current {
                Some(access) => {
                    warn!(error = %err, "early refresh failed, using current token");
                    Ok(access)
                }
                None => Err(err),
            },
        }
    }

    /// Snapshot of the current token state.
    pub async fn token_state(&self) -> TokenState {
        self.session.lock().await.token.clone()
    }

    /// Replace the token state, clearing any earlier refresh failure.
    pub async fn set_token_state(&self, state: TokenState) {
        let mut session = self.session.lock().await;
        session.token = state;
        session.failed = false;
    }

    pub async fn status(&self) -> AuthStatus {
        if self.in_flight.load(Ordering::Acquire) > 0 {
            return AuthStatus::Authenticating;
        }
        let session = self.session.lock().await;
        if session.failed {
            AuthStatus::AuthFailed
        } else if !session.token.has_access_token() {
            AuthStatus::Unauthenticated
        } else if session.token.is_valid() {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Stale
        }
    }

    async fn refresh_locked(
        &self,
        session: &mut Session,
        refresh_token: Option<&str>,
    ) -> Result<TokenState, AuthError> {
        let Some(refresh_token) = refresh_token else {
            if !session.token.has_refresh_token() {
                session.failed = true;
            }
            return Err(AuthError::RefreshFailed {
                status: None,
                detail: "no refresh token available".to_string(),
            });
        };

        let _flight = InFlight::enter(&self.in_flight);
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];

        match self.request_token(&form, Some(refresh_token)).await {
            Ok(token) => {
                session.token = token.clone();
                session.failed = false;
                debug!(expires_at = ?token.expires_at, "access token refreshed");
                Ok(token)
            }
            Err(failure) => {
                let err = failure.into_auth_error(Grant::RefreshToken);
                // Only a rejection of the stored refresh token ends the session.
                let stored = session.token.refresh_token.as_deref() == Some(refresh_token);
                if stored && matches!(err, AuthError::RefreshFailed { .. }) {
                    session.failed = true;
                }
                warn!(error = %err, "token refresh failed");
                Err(err)
            }
        }
    }

    async fn request_token(
        &self,
        form: &[(&str, &str)],
        previous_refresh: Option<&str>,
    ) -> Result<TokenState, TokenFailure> {
        debug!(url = %self.token_url, "requesting token");
        let response = self
            .client
            .post(&self.token_url)
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await
            .map_err(|err| TokenFailure::Network(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| TokenFailure::Network(err.to_string()))?;
        if status != StatusCode::OK {
            return Err(TokenFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: TokenResponse = serde_json::from_str(&body)
            .map_err(|err| TokenFailure::Malformed(format!("malformed token response: {err}")))?;
        payload.into_state(self.default_lifetime, previous_refresh)
    }
}

#[async_trait]
impl AccessTokenProvider for Authenticator {
    async fn access_token(&self) -> Result<String, AuthError> {
        self.ensure_valid_token().await
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Grant {
    AuthorizationCode,
    RefreshToken,
}

#[derive(Debug)]
enum TokenFailure {
    Network(String),
    Status { status: u16, body: String },
    Malformed(String),
}

impl TokenFailure {
    fn into_auth_error(self, grant: Grant) -> AuthError {
        let (status, detail) = match self {
            Self::Network(message) => return AuthError::Network(message),
            Self::Status { status, body } if status >= 500 => {
                return AuthError::ServerRejected { status, body };
            }
            Self::Status { status, body } => (Some(status), body),
            Self::Malformed(detail) => (None, detail),
        };
        match grant {
            Grant::AuthorizationCode => AuthError::TokenExchangeFailed { status, detail },
            Grant::RefreshToken => AuthError::RefreshFailed { status, detail },
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_state(
        self,
        default_lifetime: Duration,
        previous_refresh: Option<&str>,
    ) -> Result<TokenState, TokenFailure> {
        if self.access_token.trim().is_empty() {
            return Err(TokenFailure::Malformed(
                "token response has an empty access_token".to_string(),
            ));
        }
        let lifetime = match self.expires_in {
            Some(secs) if secs <= 0 => {
                return Err(TokenFailure::Malformed(format!(
                    "token response has non-positive expires_in {secs}"
                )));
            }
            Some(secs) => Duration::try_seconds(secs).ok_or_else(out_of_range)?,
            None => default_lifetime,
        };
        let expires_at = Utc::now()
            .checked_add_signed(lifetime)
            .ok_or_else(out_of_range)?;
        let refresh_token = self
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string));
        Ok(TokenState::new(self.access_token, refresh_token, expires_at))
    }
}

fn out_of_range() -> TokenFailure {
    TokenFailure::Malformed("token response expires_in out of range".to_string())
}

/// Marks a token request as in flight for [`Authenticator::status`].
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
