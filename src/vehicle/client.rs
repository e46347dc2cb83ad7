use std::sync::Arc;

use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::command::{CommandOutcome, CommandRequest, VehicleCommand};
use super::types::{VehicleList, VehicleResource, VehicleStatus};
use crate::auth::{AccessTokenProvider, Authenticator};
use crate::error::{ApiError, Result};
use crate::transport;

pub const DEFAULT_API_BASE_URL: &str = "https://api.volvocars.com";
const VEHICLES_PATH: [&str; 3] = ["connected-vehicle", "v2", "vehicles"];

/// Authenticated client for the connected-vehicle API.
///
/// Every call asks the token provider for a valid token first, so an
/// expired token is refreshed before the request goes out. Errors are
/// returned as-is; nothing is retried.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use connected_vehicle::auth::{Authenticator, ClientCredentials, ScopeSet};
/// use connected_vehicle::vehicle::VehicleApiClient;
///
/// # async fn example() -> connected_vehicle::error::Result<()> {
/// let auth = Arc::new(Authenticator::new(
///     ClientCredentials::new("client", "secret", "api-key"),
///     ScopeSet::vehicle_control(),
///     "http://localhost:8000/callback",
/// ));
/// auth.exchange_code_for_token("code-from-redirect").await?;
///
/// let client = VehicleApiClient::from_authenticator(auth);
/// let vehicles = client.get_vehicles().await?;
/// for vin in vehicles.vins() {
///     let outcome = client.lock(&vin).await?;
///     println!("{vin}: {outcome:?}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct VehicleApiClient {
    client: reqwest::Client,
    auth: Arc<dyn AccessTokenProvider>,
    api_key: String,
    base_url: String,
}

impl VehicleApiClient {
    pub fn new(auth: Arc<dyn AccessTokenProvider>, api_key: impl Into<String>) -> Self {
        Self {
            client: transport::default_client(),
            auth,
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Client using the authenticator's API key.
    pub fn from_authenticator(auth: Arc<Authenticator>) -> Self {
        let api_key = auth.credentials().api_key.clone();
        Self::new(auth, api_key)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List the vehicles linked to the authorized account.
    pub async fn get_vehicles(&self) -> Result<VehicleList> {
        let body = self.get_json(&[]).await?;
        VehicleList::from_json(body)
    }

    /// Current status of one vehicle, passed through unchanged.
    pub async fn get_vehicle_status(&self, vin: impl AsRef<str>) -> Result<VehicleStatus> {
        let body = self.get_json(&[vin.as_ref(), "status"]).await?;
        Ok(VehicleStatus(body))
    }

    /// Raw body of another read endpoint of one vehicle.
    pub async fn get_vehicle_resource(
        &self,
        vin: impl AsRef<str>,
        resource: VehicleResource,
    ) -> Result<Value> {
        let segment = resource.path_segment();
        self.get_json(&[vin.as_ref(), segment.as_str()]).await
    }

    pub async fn get_lock_status(&self, vin: impl AsRef<str>) -> Result<Value> {
        self.get_vehicle_resource(vin, VehicleResource::Doors).await
    }

    pub async fn get_fuel_status(&self, vin: impl AsRef<str>) -> Result<Value> {
        self.get_vehicle_resource(vin, VehicleResource::Fuel).await
    }

    pub async fn get_engine_status(&self, vin: impl AsRef<str>) -> Result<Value> {
        self.get_vehicle_resource(vin, VehicleResource::EngineStatus)
            .await
    }

    pub async fn get_warnings(&self, vin: impl AsRef<str>) -> Result<Value> {
        self.get_vehicle_resource(vin, VehicleResource::Warnings).await
    }

    /// Send a remote command.
    ///
    /// HTTP 200 and 202 are both success. A 202 means the command was
    /// accepted, not that the vehicle has executed it; see
    /// [`CommandOutcome`]. Any other status is
    /// [`ApiError::RequestFailed`].
    pub async fn send_command(
        &self,
        vin: impl AsRef<str>,
        command: VehicleCommand,
    ) -> Result<CommandOutcome> {
        let vin = vin.as_ref();
        let mut segments = vec![vin, "commands"];
        segments.extend(command.path().split('/'));
        let url = self.endpoint(&segments)?;

        let response = self.authorized(Method::POST, url).await?.send().await?;
        let status = response.status().as_u16();
        match CommandOutcome::from_status(status) {
            Some(outcome) => {
                info!(%vin, %command, ?outcome, "vehicle command sent");
                Ok(outcome)
            }
            None => {
                let body = transport::read_body(response).await;
                warn!(%vin, %command, status, "vehicle command rejected");
                Err(ApiError::request_failed(status, body))
            }
        }
    }

    pub async fn dispatch(&self, request: &CommandRequest) -> Result<CommandOutcome> {
        self.send_command(&request.vin, request.command).await
    }

    pub async fn lock(&self, vin: impl AsRef<str>) -> Result<CommandOutcome> {
        self.send_command(vin, VehicleCommand::Lock).await
    }

    pub async fn unlock(&self, vin: impl AsRef<str>) -> Result<CommandOutcome> {
        self.send_command(vin, VehicleCommand::Unlock).await
    }

    pub async fn start_engine(&self, vin: impl AsRef<str>) -> Result<CommandOutcome> {
        self.send_command(vin, VehicleCommand::EngineStart).await
    }

    pub async fn stop_engine(&self, vin: impl AsRef<str>) -> Result<CommandOutcome> {
        self.send_command(vin, VehicleCommand::EngineStop).await
    }

    pub async fn honk(&self, vin: impl AsRef<str>) -> Result<CommandOutcome> {
        self.send_command(vin, VehicleCommand::Honk).await
    }

    pub async fn flash(&self, vin: impl AsRef<str>) -> Result<CommandOutcome> {
        self.send_command(vin, VehicleCommand::Flash).await
    }

    async fn get_json(&self, segments: &[&str]) -> Result<Value> {
        let url = self.endpoint(segments)?;
        let response = self.authorized(Method::GET, url).await?.send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = transport::read_body(response).await;
            warn!(status = status.as_u16(), "vehicle API request failed");
            return Err(ApiError::request_failed(status.as_u16(), body));
        }
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|err| ApiError::MalformedResponse(format!("{err}: {body}")))
    }

    /// Token lookup happens here, before any request is built.
    async fn authorized(&self, method: Method, url: Url) -> Result<reqwest::RequestBuilder> {
        let token = self.auth.access_token().await?;
        debug!(%method, %url, "vehicle API request");
        let headers = transport::vehicle_headers(&token, &self.api_key)?;
        Ok(self.client.request(method, url).headers(headers))
    }

    /// `{base}/connected-vehicle/v2/vehicles/{segments..}` with each segment
    /// percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|err| {
            ApiError::Configuration(format!("invalid API base URL {}: {err}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                ApiError::Configuration(format!("API base URL {} cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .extend(VEHICLES_PATH)
            .extend(segments);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::auth::AuthError;

    struct FixedToken;

    #[async_trait]
    impl AccessTokenProvider for FixedToken {
        async fn access_token(&self) -> std::result::Result<String, AuthError> {
            Ok("fixed".to_string())
        }
    }

    fn client(base: &str) -> VehicleApiClient {
        VehicleApiClient::new(Arc::new(FixedToken), "key").with_base_url(base)
    }

    #[test]
    fn endpoint_joins_segments_under_vehicles_path() {
        let url = client("https://api.example.com")
            .endpoint(&["YV1ZWK8V4S2663123", "status"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/connected-vehicle/v2/vehicles/YV1ZWK8V4S2663123/status"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let url = client("http://127.0.0.1:9000/proxy/").endpoint(&[]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9000/proxy/connected-vehicle/v2/vehicles"
        );
    }

    #[test]
    fn endpoint_encodes_vin_as_single_segment() {
        let url = client("https://api.example.com")
            .endpoint(&["A/B C", "status"])
            .unwrap();
        assert!(url.as_str().ends_with("/vehicles/A%2FB%20C/status"));
    }

    #[test]
    fn invalid_base_url_is_configuration_error() {
        let result = client("no scheme here").endpoint(&[]);
        assert!(matches!(result, Err(ApiError::Configuration(_))));
    }
}
