//! Convenience re-exports for common use.

pub use crate::auth::{
    AccessTokenProvider, AuthError, AuthStatus, Authenticator, ClientCredentials, ScopeSet,
    TokenState,
};
pub use crate::config::Config;
pub use crate::error::{ApiError, ErrorCategory, RecoverySuggestion, Result};
pub use crate::vehicle::{
    CommandOutcome, CommandRequest, VehicleApiClient, VehicleCommand, VehicleList,
    VehicleResource, VehicleStatus, Vin,
};
