use std::fmt;

use bon::Builder;

/// OAuth2 client credentials plus the vehicle API key.
///
/// Values are passed through as given; the remote server decides whether
/// they are well-formed.
///
/// # Example
/// ```
/// use connected_vehicle::auth::ClientCredentials;
///
/// let creds = ClientCredentials::builder()
///     .client_id("my-client")
///     .client_secret("my-secret")
///     .api_key("my-api-key")
///     .build();
/// assert_eq!(creds.client_id, "my-client");
/// ```
#[derive(Clone, PartialEq, Eq, Builder)]
pub struct ClientCredentials {
    #[builder(into)]
    pub client_id: String,
    #[builder(into)]
    pub client_secret: String,
    #[builder(into)]
    pub api_key: String,
}

impl ClientCredentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_key: api_key.into(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &mask_secret(&self.client_secret))
            .field("api_key", &mask_secret(&self.api_key))
            .finish()
    }
}

/// Keep a short prefix of a secret for diagnostics, hide the rest.
pub fn mask_secret(secret: &str) -> String {
    const VISIBLE: usize = 4;
    if secret.is_empty() {
        return String::new();
    }
    let prefix: String = secret.chars().take(VISIBLE).collect();
    if secret.chars().count() <= VISIBLE {
        "..".to_string()
    } else {
        format!("{prefix}..")
    }
}

/// Well-known scope identifiers of the Volvo Cars API.
pub mod scopes {
    pub const OPENID: &str = "openid";
    pub const VEHICLE_RELATION: &str = "conve:vehicle_relation";
    pub const FUEL_STATUS: &str = "conve:fuel_status";
    pub const BATTERY_CHARGE_LEVEL: &str = "conve:battery_charge_level";
    pub const ENGINE_STATUS: &str = "conve:engine_status";
    pub const LOCK_STATUS: &str = "conve:lock_status";
    pub const LOCATION_READ: &str = "location:read";
    pub const COMMANDS: &str = "conve:commands";
    pub const LOCK: &str = "conve:lock";
    pub const UNLOCK: &str = "conve:unlock";
    pub const ENGINE_START_STOP: &str = "conve:engine_start_stop";
    pub const HONK_FLASH: &str = "conve:honk_flash";
}

/// Ordered list of requested scopes.
///
/// Order is preserved so the authorization URL is stable; duplicates are
/// kept as given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet(Vec<String>);

impl ScopeSet {
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(scopes.into_iter().map(Into::into).collect())
    }

    /// Read-only scopes: identity, vehicle relation and status reads.
    pub fn basic() -> Self {
        Self::new([
            scopes::OPENID,
            scopes::FUEL_STATUS,
            scopes::BATTERY_CHARGE_LEVEL,
            scopes::ENGINE_STATUS,
            scopes::LOCK_STATUS,
            scopes::VEHICLE_RELATION,
            scopes::LOCATION_READ,
        ])
    }

    /// [`basic`](Self::basic) plus the remote command scopes.
    pub fn vehicle_control() -> Self {
        let mut set = Self::basic();
        for scope in [
            scopes::COMMANDS,
            scopes::LOCK,
            scopes::UNLOCK,
            scopes::ENGINE_START_STOP,
            scopes::HONK_FLASH,
        ] {
            set.push(scope);
        }
        set
    }

    pub fn push(&mut self, scope: impl Into<String>) {
        self.0.push(scope.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of the `scope` query parameter (space-delimited).
    pub fn to_param(&self) -> String {
        self.0.join(" ")
    }
}

impl<S: Into<String>> FromIterator<S> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}
