use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// OAuth token state owned by an [`Authenticator`](super::Authenticator).
///
/// `access_token` and `expires_at` are always set together. The whole value
/// is replaced on every successful exchange or refresh.
///
/// # Example
/// ```
/// use chrono::{Duration, Utc};
/// use connected_vehicle::auth::TokenState;
///
/// let state = TokenState::new("access", Some("refresh".into()), Utc::now() + Duration::minutes(30));
/// assert!(state.is_valid());
/// assert!(!TokenState::empty().is_valid());
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenState {
    /// State with no tokens at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token,
            expires_at: Some(expires_at),
        }
    }

    /// True iff an access token is present and expires after `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match (&self.access_token, self.expires_at) {
            (Some(_), Some(expires_at)) => expires_at > now,
            _ => false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// True if the token is missing, expired, or expires within `margin`.
    pub fn needs_refresh(&self, margin: Duration) -> bool {
        !self.is_valid_at(Utc::now() + margin)
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }
}

impl fmt::Debug for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenState")
            .field("access_token", &self.access_token.as_ref().map(|_| ".."))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| ".."))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Returns true iff `state` carries an access token that has not expired.
pub fn is_token_valid(state: &TokenState) -> bool {
    state.is_valid()
}
