mod common;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use connected_vehicle::auth::{AuthError, AuthStatus};
use connected_vehicle::error::{ApiError, ErrorCategory, RecoverySuggestion};
use connected_vehicle::vehicle::{CommandOutcome, CommandRequest, VehicleCommand, Vin};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{authenticator, client, expired_state, token_body, valid_state, vehicle_path, VIN};

#[tokio::test]
async fn status_sends_bearer_token_and_returns_body_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(vehicle_path(&format!("/{VIN}/status"))))
        .and(header("authorization", "Bearer tok1"))
        .and(header("accept", "application/json"))
        .and(header("content-type", "application/json"))
        .and(header("vcc-api-key", "api-key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"fuelLevel": 55})))
        .expect(1)
        .mount(&server)
        .await;

    let auth = Arc::new(authenticator(&server).with_token_state(valid_state("tok1")));
    let status = client(&server, auth).get_vehicle_status(VIN).await.unwrap();

    assert_eq!(status.as_json(), &json!({"fuelLevel": 55}));
    assert_eq!(status.get("fuelLevel"), Some(&json!(55)));
}

#[tokio::test]
async fn vehicle_list_accepts_data_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(vehicle_path("")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"vin": VIN}, {"vin": "YV1AAAAAAAA000001"}]
        })))
        .mount(&server)
        .await;

    let auth = Arc::new(authenticator(&server).with_token_state(valid_state("tok1")));
    let vehicles = client(&server, auth).get_vehicles().await.unwrap();

    assert_eq!(
        vehicles.vins(),
        vec![Vin::from(VIN), Vin::from("YV1AAAAAAAA000001")]
    );
}

#[tokio::test]
async fn vehicle_list_accepts_bare_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(vehicle_path("")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"vin": VIN}])))
        .mount(&server)
        .await;

    let auth = Arc::new(authenticator(&server).with_token_state(valid_state("tok1")));
    let vehicles = client(&server, auth).get_vehicles().await.unwrap();
    assert_eq!(vehicles.records, vec![json!({"vin": VIN})]);
}

#[tokio::test]
async fn non_json_body_is_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(vehicle_path(&format!("/{VIN}/status"))))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let auth = Arc::new(authenticator(&server).with_token_state(valid_state("tok1")));
    let err = client(&server, auth)
        .get_vehicle_status(VIN)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::MalformedResponse(_)));
    assert_eq!(err.category(), ErrorCategory::Serialization);
}

#[tokio::test]
async fn commands_accept_200_and_202() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(vehicle_path(&format!("/{VIN}/commands/lock"))))
        .and(header("authorization", "Bearer tok1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(vehicle_path(&format!("/{VIN}/commands/unlock"))))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let auth = Arc::new(authenticator(&server).with_token_state(valid_state("tok1")));
    let client = client(&server, auth);

    assert_eq!(client.lock(VIN).await.unwrap(), CommandOutcome::Executed);
    let outcome = client
        .dispatch(&CommandRequest::new(VIN, VehicleCommand::Unlock))
        .await
        .unwrap();
    assert_eq!(outcome, CommandOutcome::Accepted);
    assert!(outcome.is_pending());
}

#[tokio::test]
async fn engine_commands_use_nested_paths() {
    let server = MockServer::start().await;
    for action in ["start", "stop"] {
        Mock::given(method("POST"))
            .and(path(vehicle_path(&format!("/{VIN}/commands/engine/{action}"))))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;
    }

    let auth = Arc::new(authenticator(&server).with_token_state(valid_state("tok1")));
    let client = client(&server, auth);

    assert_eq!(client.start_engine(VIN).await.unwrap(), CommandOutcome::Accepted);
    assert_eq!(client.stop_engine(VIN).await.unwrap(), CommandOutcome::Accepted);
}

#[tokio::test]
async fn rejected_command_reports_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(vehicle_path(&format!("/{VIN}/commands/unlock"))))
        .respond_with(ResponseTemplate::new(401).set_body_string("token revoked"))
        .expect(1)
        .mount(&server)
        .await;

    let auth = Arc::new(authenticator(&server).with_token_state(valid_state("tok1")));
    let err = client(&server, auth).unlock(VIN).await.unwrap_err();

    match &err {
        ApiError::RequestFailed { status, body } => {
            assert_eq!(*status, 401);
            assert_eq!(body, "token revoked");
        }
        other => panic!("expected RequestFailed, got {other:?}"),
    }
    assert_eq!(err.category(), ErrorCategory::Authentication);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn unknown_vehicle_suggests_checking_vin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(vehicle_path("/UNKNOWN/doors")))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such vehicle"))
        .mount(&server)
        .await;

    let auth = Arc::new(authenticator(&server).with_token_state(valid_state("tok1")));
    let err = client(&server, auth)
        .get_lock_status("UNKNOWN")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.recovery_suggestion(), RecoverySuggestion::CheckVehicle);
}

#[tokio::test]
async fn missing_token_sends_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let auth = Arc::new(authenticator(&server));
    let client = client(&server, auth);

    let err = client.get_vehicle_status(VIN).await.unwrap_err();
    assert!(matches!(err, ApiError::Auth(AuthError::NotAuthenticated)));
    assert_eq!(err.recovery_suggestion(), RecoverySuggestion::Reauthorize);

    let err = client.honk(VIN).await.unwrap_err();
    assert!(matches!(err, ApiError::Auth(AuthError::NotAuthenticated)));
}

#[tokio::test]
async fn expired_token_is_refreshed_before_the_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok2", None, 1800)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(vehicle_path(&format!("/{VIN}/fuel"))))
        .and(header("authorization", "Bearer tok2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"fuelAmount": 40})))
        .expect(1)
        .mount(&server)
        .await;

    let auth = Arc::new(authenticator(&server).with_token_state(expired_state("tok1", Some("r1"))));
    let fuel = client(&server, auth.clone())
        .get_fuel_status(VIN)
        .await
        .unwrap();

    assert_eq!(fuel, json!({"fuelAmount": 40}));
    assert_eq!(auth.status().await, AuthStatus::Authenticated);
}

#[tokio::test]
async fn concurrent_calls_share_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("tok2", Some("r2"), 1800))
                .set_delay(StdDuration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(vehicle_path(&format!("/{VIN}/status"))))
        .and(header("authorization", "Bearer tok2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(5)
        .mount(&server)
        .await;

    let auth = Arc::new(authenticator(&server).with_token_state(expired_state("tok1", Some("r1"))));
    let client = client(&server, auth);

    let calls = (0..5).map(|_| client.get_vehicle_status(VIN));
    let results = futures::future::join_all(calls).await;

    for result in results {
        assert_eq!(result.unwrap().into_json(), json!({"ok": true}));
    }
}

#[tokio::test]
async fn refresh_server_error_surfaces_as_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let auth = Arc::new(authenticator(&server).with_token_state(expired_state("tok1", Some("r1"))));
    let err = client(&server, auth).get_warnings(VIN).await.unwrap_err();

    assert!(matches!(
        err,
        ApiError::Auth(AuthError::ServerRejected { status: 503, .. })
    ));
    assert!(err.is_retryable());
    assert_eq!(err.recovery_suggestion(), RecoverySuggestion::RetryLater);
}

#[tokio::test]
async fn api_key_that_cannot_be_a_header_is_rejected_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(0)
        .mount(&server)
        .await;

    let auth = Arc::new(authenticator(&server).with_token_state(valid_state("tok1")));
    let client = connected_vehicle::vehicle::VehicleApiClient::new(auth, "bad\nkey")
        .with_base_url(server.uri());

    let err = client.get_vehicles().await.unwrap_err();
    assert!(matches!(err, ApiError::Configuration(_)));
}

#[tokio::test]
async fn truncated_success_body_is_a_network_error() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let _ = socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"fuel")
            .await;
        let _ = socket.shutdown().await;
    });

    let token_server = MockServer::start().await;
    let auth = Arc::new(authenticator(&token_server).with_token_state(valid_state("tok1")));
    let client = connected_vehicle::vehicle::VehicleApiClient::from_authenticator(auth)
        .with_base_url(format!("http://{addr}"));

    let err = client.get_vehicle_status(VIN).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "got {err:?}");
    assert_eq!(err.category(), ErrorCategory::Network);
}
