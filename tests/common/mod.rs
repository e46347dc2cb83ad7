#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use connected_vehicle::auth::{Authenticator, ClientCredentials, ScopeSet, TokenState};
use connected_vehicle::vehicle::VehicleApiClient;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/as/token.oauth2";
pub const REDIRECT_URI: &str = "http://localhost:8000/callback";
pub const VIN: &str = "YV1ZWK8V4S2663123";

pub fn credentials() -> ClientCredentials {
    ClientCredentials::new("client-1", "secret-1", "api-key-1")
}

pub fn authenticator(server: &MockServer) -> Authenticator {
    Authenticator::new(credentials(), ScopeSet::basic(), REDIRECT_URI)
        .with_auth_base_url(server.uri())
}

pub fn client(server: &MockServer, auth: Arc<Authenticator>) -> VehicleApiClient {
    VehicleApiClient::from_authenticator(auth).with_base_url(server.uri())
}

pub fn valid_state(access: &str) -> TokenState {
    TokenState::new(access, Some("r1".to_string()), Utc::now() + Duration::minutes(30))
}

pub fn expired_state(access: &str, refresh: Option<&str>) -> TokenState {
    TokenState::new(
        access,
        refresh.map(str::to_string),
        Utc::now() - Duration::minutes(1),
    )
}

pub fn token_body(access: &str, refresh: Option<&str>, expires_in: i64) -> serde_json::Value {
    let mut body = json!({
        "access_token": access,
        "token_type": "Bearer",
        "expires_in": expires_in,
    });
    if let Some(refresh) = refresh {
        body["refresh_token"] = json!(refresh);
    }
    body
}

pub async fn mount_token(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(response)
        .mount(server)
        .await;
}

pub fn vehicle_path(segments: &str) -> String {
    format!("/connected-vehicle/v2/vehicles{segments}")
}
