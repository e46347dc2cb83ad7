//! OAuth2 authorization-code flow and token state.

pub mod authenticator;
pub mod credentials;
pub mod error;
pub mod token;

pub use authenticator::{
    build_authorization_url, AccessTokenProvider, AuthStatus, Authenticator,
    DEFAULT_AUTH_BASE_URL, DEFAULT_TOKEN_LIFETIME_MINUTES,
};
pub use credentials::{mask_secret, scopes, ClientCredentials, ScopeSet};
pub use error::AuthError;
pub use token::{is_token_valid, TokenState};
