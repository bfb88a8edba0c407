#![allow(clippy::unwrap_used)]
// Integration tests for `CloudClient` and `Session` using wiremock.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

use simmer_api::{
    Appliance, CloudClient, CookingSession, Credentials, Error, KeepWarmUpdate, PressureLevel,
    ProgramState, Session, TransportConfig, VentingMode, WarmTemp,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn account_credentials() -> Credentials {
    Credentials::Account {
        email: "cook@example.com".into(),
        password: SecretString::from("hunter2"),
        client_id: "test-client".into(),
        region: "us-east-2".into(),
    }
}

/// Client whose API and auth calls both land on the mock server.
fn client_for(server: &MockServer, credentials: Credentials) -> CloudClient {
    let transport = TransportConfig::default();
    let auth_url = Url::parse(&server.uri()).unwrap();
    let session = Session::new(credentials, &transport)
        .unwrap()
        .with_auth_url(auth_url);
    let base_url = Url::parse(&server.uri()).unwrap();
    CloudClient::new(base_url, session, &transport).unwrap()
}

fn login_response(token: &str, expires_in: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "AuthenticationResult": {
            "AccessToken": token,
            "ExpiresIn": expires_in,
            "TokenType": "Bearer",
            "RefreshToken": "refresh-1",
        }
    }))
}

fn password_login() -> MockBuilder {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("X-Amz-Target", "AWSCognitoIdentityProviderService.InitiateAuth"))
        .and(body_partial_json(json!({ "AuthFlow": "USER_PASSWORD_AUTH" })))
}

fn refresh_login() -> MockBuilder {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("X-Amz-Target", "AWSCognitoIdentityProviderService.InitiateAuth"))
        .and(body_partial_json(json!({ "AuthFlow": "REFRESH_TOKEN_AUTH" })))
}

fn pot() -> Appliance {
    Appliance::new("dev-1", 0)
}

fn active_session(device_id: &str) -> CookingSession {
    serde_json::from_value(json!({
        "device_id": device_id,
        "device_state": "kitchenos:DeviceState:Running",
    }))
    .unwrap()
}

// ── Token manager ───────────────────────────────────────────────────

#[tokio::test]
async fn token_is_cached_until_expiry_margin() {
    let server = MockServer::start().await;
    password_login()
        .respond_with(login_response("tok-1", 3600))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, account_credentials());
    assert_eq!(client.session().bearer_token().await.unwrap(), "tok-1");
    // Second call must reuse the cached token -- expect(1) verifies on drop.
    assert_eq!(client.session().bearer_token().await.unwrap(), "tok-1");
}

#[tokio::test]
async fn token_inside_expiry_margin_is_renewed() {
    let server = MockServer::start().await;
    // 30s lifetime is inside the 60s safety margin: every call must
    // produce a token whose expiry is strictly in the future.
    password_login()
        .respond_with(login_response("tok-1", 30))
        .expect(1)
        .up_to_n_times(1)
        .mount(&server)
        .await;
    refresh_login()
        .respond_with(login_response("tok-2", 30))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, account_credentials());
    assert_eq!(client.session().bearer_token().await.unwrap(), "tok-1");
    assert_eq!(client.session().bearer_token().await.unwrap(), "tok-2");
}

#[tokio::test]
async fn concurrent_callers_trigger_exactly_one_login() {
    let server = MockServer::start().await;
    password_login()
        .respond_with(login_response("tok-1", 3600).set_delay(Duration::from_millis(50)))
        .expect(1)
        .mount(&server)
        .await;

    let client = Arc::new(client_for(&server, account_credentials()));
    let session = client.session();
    let (a, b, c, d, e, f, g, h) = tokio::join!(
        session.bearer_token(),
        session.bearer_token(),
        session.bearer_token(),
        session.bearer_token(),
        session.bearer_token(),
        session.bearer_token(),
        session.bearer_token(),
        session.bearer_token(),
    );
    for token in [a, b, c, d, e, f, g, h] {
        assert_eq!(token.unwrap(), "tok-1");
    }
}

#[tokio::test]
async fn rejected_credentials_surface_as_authentication() {
    let server = MockServer::start().await;
    password_login()
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "NotAuthorizedException",
            "message": "Incorrect username or password.",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, account_credentials());
    let err = client.session().bearer_token().await.unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }), "got: {err:?}");
    assert!(err.to_string().contains("Incorrect username or password."));
}

#[tokio::test]
async fn captured_token_is_used_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cooking/execute"))
        .and(header("authorization", "Bearer captured-tok"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(
        &server,
        Credentials::CapturedToken {
            token: SecretString::from("captured-tok"),
        },
    );
    client.cancel(&pot()).await.unwrap();
}

#[tokio::test]
async fn captured_token_rejection_cannot_be_renewed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cooking/execute"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(
        &server,
        Credentials::CapturedToken {
            token: SecretString::from("expired-tok"),
        },
    );
    let err = client.cancel(&pot()).await.unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }), "got: {err:?}");
}

// ── Command dispatch ────────────────────────────────────────────────

#[tokio::test]
async fn start_pressure_cook_sends_mapped_payload_and_marks_active() {
    let server = MockServer::start().await;
    password_login()
        .respond_with(login_response("tok-1", 3600))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cooking/execute"))
        .and(body_partial_json(json!({
            "command": "kitchenos:Command:Start",
            "device_id": "dev-1",
            "appliance_module_idx": 0,
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, account_credentials());
    assert_eq!(client.program_state("dev-1"), ProgramState::Unknown);

    client
        .start_pressure_cook(
            &pot(),
            PressureLevel::High,
            600,
            VentingMode::NaturalQuick,
            Some(300),
            false,
        )
        .await
        .unwrap();

    assert_eq!(client.program_state("dev-1"), ProgramState::Active);

    // The capability body must carry the four vendor setting ids with
    // the mapped values (plus the optional venting time).
    let requests = server.received_requests().await.unwrap();
    let execute = requests
        .iter()
        .find(|r| r.url.path() == "/cooking/execute")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&execute.body).unwrap();
    let settings = body["capability"]["settings"].as_array().unwrap();
    let setting = |id: &str| {
        settings
            .iter()
            .find(|s| s["reference_setting_id"] == id)
            .unwrap_or_else(|| panic!("missing setting {id}"))
            .clone()
    };

    assert_eq!(
        body["capability"]["reference_capability_id"],
        "kitchenos:InstantBrands:PressureCook"
    );
    assert_eq!(
        setting("kitchenos:InstantBrands:PressureSetting")["value"]["reference_value_id"],
        "kitchenos:InstantBrands:PressureHigh"
    );
    assert_eq!(
        setting("kitchenos:InstantBrands:TimeSetting")["value"]["value"],
        600
    );
    assert_eq!(
        setting("kitchenos:InstantBrands:VentingSetting")["value"]["reference_value_id"],
        "kitchenos:InstantBrands:VentingNaturalQuick"
    );
    assert_eq!(
        setting("kitchenos:InstantBrands:VentingTimeSetting")["value"]["value"],
        300
    );
    assert_eq!(
        setting("kitchenos:InstantBrands:NutriBoostSetting")["value"]["value"],
        false
    );
}

#[tokio::test]
async fn start_while_active_is_accepted_not_an_error() {
    let server = MockServer::start().await;
    password_login()
        .respond_with(login_response("tok-1", 3600))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cooking/execute"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, account_credentials());
    // Poll said the device is already running something.
    client.apply_sessions(&["dev-1".into()], &[active_session("dev-1")]);
    assert_eq!(client.program_state("dev-1"), ProgramState::Active);

    // The cloud accepts the call and changes nothing; the client
    // reports success rather than inventing an error the vendor
    // doesn't signal.
    client
        .start_keep_warm(&pot(), WarmTemp::Celsius(70), 7200)
        .await
        .unwrap();
    assert_eq!(client.program_state("dev-1"), ProgramState::Active);
}

#[tokio::test]
async fn http_401_forces_one_refresh_then_one_retry() {
    let server = MockServer::start().await;
    password_login()
        .respond_with(login_response("tok-1", 3600))
        .expect(1)
        .mount(&server)
        .await;
    refresh_login()
        .respond_with(login_response("tok-2", 3600))
        .expect(1)
        .mount(&server)
        .await;
    // First attempt (stale token) is rejected...
    Mock::given(method("POST"))
        .and(path("/cooking/execute"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    // ...the retry must carry the renewed token.
    Mock::given(method("POST"))
        .and(path("/cooking/execute"))
        .and(header("authorization", "Bearer tok-2"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, account_credentials());
    client.cancel(&pot()).await.unwrap();
}

#[tokio::test]
async fn second_401_surfaces_as_authentication() {
    let server = MockServer::start().await;
    password_login()
        .respond_with(login_response("tok-1", 3600))
        .expect(1)
        .mount(&server)
        .await;
    refresh_login()
        .respond_with(login_response("tok-2", 3600))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cooking/execute"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, account_credentials());
    let err = client.cancel(&pot()).await.unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }), "got: {err:?}");
    assert!(err.is_auth_expired());
}

#[tokio::test]
async fn cancel_while_idle_is_accepted() {
    let server = MockServer::start().await;
    password_login()
        .respond_with(login_response("tok-1", 3600))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cooking/execute"))
        .and(body_partial_json(json!({ "command": "kitchenos:Command:Cancel" })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, account_credentials());
    client.apply_sessions(&["dev-1".into()], &[]);
    assert_eq!(client.program_state("dev-1"), ProgramState::Idle);

    client.cancel(&pot()).await.unwrap();
    assert_eq!(client.program_state("dev-1"), ProgramState::Idle);

    // Cancel sends no capability block at all.
    let requests = server.received_requests().await.unwrap();
    let execute = requests
        .iter()
        .find(|r| r.url.path() == "/cooking/execute")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&execute.body).unwrap();
    assert!(body.get("capability").is_none());
}

#[tokio::test]
async fn invalid_input_never_reaches_the_network() {
    let server = MockServer::start().await;
    // No login mock either: validation must fire before any call.
    Mock::given(method("POST"))
        .and(path("/cooking/execute"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&server)
        .await;

    let err = "Medium".parse::<PressureLevel>().unwrap_err();
    assert!(matches!(err, Error::Validation { field: "pressure", .. }));

    let client = client_for(&server, account_credentials());
    let err = client
        .start_keep_warm(&pot(), WarmTemp::Celsius(5), 600)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { field: "temp_c", .. }));

    let err = client
        .update_keep_warm(&pot(), &KeepWarmUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { field: "update", .. }));
}

#[tokio::test]
async fn vendor_rejection_carries_status_and_body() {
    let server = MockServer::start().await;
    password_login()
        .respond_with(login_response("tok-1", 3600))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cooking/execute"))
        .respond_with(
            ResponseTemplate::new(409).set_body_string("appliance lid is open"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, account_credentials());
    let err = client.cancel(&pot()).await.unwrap_err();
    match err {
        Error::Command { status, message } => {
            assert_eq!(status, 409);
            assert_eq!(message, "appliance lid is open");
        }
        other => panic!("expected Command error, got: {other:?}"),
    }
}

#[tokio::test]
async fn slow_response_surfaces_as_timeout() {
    let server = MockServer::start().await;
    password_login()
        .respond_with(login_response("tok-1", 3600))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cooking/execute"))
        .respond_with(ResponseTemplate::new(202).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let transport = TransportConfig::with_timeout_secs(1);
    let session = Session::new(account_credentials(), &transport)
        .unwrap()
        .with_auth_url(Url::parse(&server.uri()).unwrap());
    let client =
        CloudClient::new(Url::parse(&server.uri()).unwrap(), session, &transport).unwrap();

    let err = client.cancel(&pot()).await.unwrap_err();
    assert!(matches!(err, Error::Timeout { timeout_secs: 1 }), "got: {err:?}");
}

// ── Device discovery ────────────────────────────────────────────────

#[tokio::test]
async fn list_devices_parses_account_profile() {
    let server = MockServer::start().await;
    password_login()
        .respond_with(login_response("tok-1", 3600))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/"))
        .and(header("accept", "application/x.default+json;version=2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": "u-1",
            "devices": [
                {
                    "device_id": "dev-1",
                    "appliance_module_idx": 0,
                    "name": "Kitchen Pot",
                    "model_id": "kitchenos:InstantBrands:InstantPotProPlus",
                },
                { "device_id": "dev-2" },
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, account_credentials());
    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].device_id, "dev-1");
    assert_eq!(devices[0].display_name(), "Kitchen Pot");
    assert_eq!(
        devices[0].model_id.as_deref(),
        Some("kitchenos:InstantBrands:InstantPotProPlus")
    );
    // Sparse records fall back to defaults.
    assert_eq!(devices[1].appliance_module_idx, 0);
    assert_eq!(devices[1].display_name(), "dev-2");
}

#[tokio::test]
async fn find_device_matches_by_id() {
    let server = MockServer::start().await;
    password_login()
        .respond_with(login_response("tok-1", 3600))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "devices": [
                { "device_id": "dev-1", "name": "Kitchen Pot" },
                { "device_id": "dev-2" },
            ],
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, account_credentials());
    let found = client.find_device("dev-2").await.unwrap();
    assert_eq!(found.unwrap().device_id, "dev-2");
    assert!(client.find_device("dev-9").await.unwrap().is_none());
}

#[tokio::test]
async fn empty_account_is_a_device_lookup_failure() {
    let server = MockServer::start().await;
    password_login()
        .respond_with(login_response("tok-1", 3600))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "devices": [] })))
        .mount(&server)
        .await;

    let client = client_for(&server, account_credentials());
    let err = client.list_devices().await.unwrap_err();
    assert!(matches!(err, Error::DeviceLookup { .. }), "got: {err:?}");
}

#[tokio::test]
async fn failed_discovery_call_is_a_device_lookup_failure() {
    let server = MockServer::start().await;
    password_login()
        .respond_with(login_response("tok-1", 3600))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = client_for(&server, account_credentials());
    let err = client.list_devices().await.unwrap_err();
    assert!(matches!(err, Error::DeviceLookup { .. }), "got: {err:?}");
}

// ── Sessions & state mirror ─────────────────────────────────────────

#[tokio::test]
async fn sessions_snapshot_drives_the_state_mirror() {
    let server = MockServer::start().await;
    password_login()
        .respond_with(login_response("tok-1", 3600))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cooking/sessions/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sessions": [
                {
                    "device_id": "dev-1",
                    "device_state": "kitchenos:DeviceState:Running",
                },
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, account_credentials());
    let sessions = client.list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].state_label(), Some("Running"));

    client.apply_sessions(&["dev-1".into(), "dev-2".into()], &sessions);
    assert_eq!(client.program_state("dev-1"), ProgramState::Active);
    assert_eq!(client.program_state("dev-2"), ProgramState::Idle);
    // Untracked devices stay unknown.
    assert_eq!(client.program_state("dev-3"), ProgramState::Unknown);
}
