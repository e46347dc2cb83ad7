//! Error classification and recovery hints.

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    NotFound,
    Api,
    Configuration,
    Serialization,
}

/// Suggested recovery action for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Retry manually after a pause.
    RetryLater,
    /// Obtain a new authorization code and exchange it.
    Reauthorize,
    /// Client id, secret or API key are wrong or lack the scope.
    CheckCredentials,
    /// Endpoint URLs or redirect URI are wrong.
    CheckConfiguration,
    /// The VIN is unknown or not linked to this account.
    CheckVehicle,
    ContactSupport,
}
