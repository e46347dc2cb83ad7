use thiserror::Error;

/// Failures of the OAuth2 token lifecycle.
///
/// Transport failures and server-side (5xx) failures are the retryable kinds;
/// the others need a new authorization code or a configuration fix.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authorization server rejected the request (status {status}): {body}")]
    ServerRejected { status: u16, body: String },

    #[error("Token exchange failed{}: {detail}", fmt_status(.status))]
    TokenExchangeFailed { status: Option<u16>, detail: String },

    #[error("Token refresh failed{}: {detail}", fmt_status(.status))]
    RefreshFailed { status: Option<u16>, detail: String },

    #[error("Not authenticated: exchange an authorization code first")]
    NotAuthenticated,

    #[error("Invalid auth configuration: {0}")]
    Configuration(String),
}

impl AuthError {
    /// Whether a manual retry of the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::ServerRejected { .. })
    }

    /// HTTP status reported by the authorization server, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerRejected { status, .. } => Some(*status),
            Self::TokenExchangeFailed { status, .. } | Self::RefreshFailed { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

fn fmt_status(status: &Option<u16>) -> String {
    status
        .map(|code| format!(" (status {code})"))
        .unwrap_or_default()
}
