//! HTTP integration tests against a mocked session backend.

use std::sync::Arc;

use carebridge_client::{
    ApiClient, AuthSession, AuthState, ClientConfig, ClientError, CredentialFetcher,
    FileTokenStore, HttpCredentialFetcher, TokenStore,
};
use carebridge_proto::{
    RoomName,
    api::{Role, SessionStatus, SignupRole, User},
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::default().with_api_base_url(server.uri())
}

fn logged_in_state() -> AuthState {
    AuthState {
        access_token: "bearer-abc".into(),
        user: User { id: "p1".into(), alias: "kim".into(), role: Role::Patient, email: None },
    }
}

async fn logged_in_client(config: &ClientConfig) -> ApiClient {
    let auth = AuthSession::in_memory();
    auth.establish(logged_in_state()).await.unwrap();
    ApiClient::new(config, auth).unwrap()
}

#[tokio::test]
async fn credential_from_wrapped_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/video/token"))
        .and(header("authorization", "Bearer bearer-abc"))
        .and(body_json(json!({ "roomName": "session-42" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "token": "media-token", "serverUrl": "wss://media.example.test" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.media_url_override = None;
    let fetcher = HttpCredentialFetcher::new(logged_in_client(&config).await, &config);

    let credential = fetcher.fetch("42").await.unwrap();
    assert_eq!(credential.token(), "media-token");
    assert_eq!(credential.server_url(), "wss://media.example.test");
}

#[tokio::test]
async fn credential_from_bare_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/video/token"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "token": "t2", "serverUrl": "ws://localhost:7880" })),
        )
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.media_url_override = None;
    let fetcher = HttpCredentialFetcher::new(logged_in_client(&config).await, &config);

    let credential = fetcher.fetch("7").await.unwrap();
    assert_eq!(credential.server_url(), "ws://localhost:7880");
}

#[tokio::test]
async fn configured_media_url_wins() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/video/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": "t", "serverUrl": "wss://from-backend" })),
        )
        .mount(&server)
        .await;

    let config = config_for(&server).with_media_url_override("wss://configured");
    let fetcher = HttpCredentialFetcher::new(logged_in_client(&config).await, &config);

    let credential = fetcher.fetch("1").await.unwrap();
    assert_eq!(credential.server_url(), "wss://configured");
}

#[tokio::test]
async fn missing_server_url_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/video/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "token": "t" } })))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.media_url_override = None;
    let fetcher = HttpCredentialFetcher::new(logged_in_client(&config).await, &config);

    let err = fetcher.fetch("1").await.unwrap_err();
    assert!(matches!(err, ClientError::MissingServerUrl), "got {err:?}");
}

#[tokio::test]
async fn unauthorized_clears_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/video/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let api = logged_in_client(&config).await;
    let auth = api.auth().clone();

    let err = api.fetch_video_token(&RoomName::for_session("9")).await.unwrap_err();
    assert!(err.requires_login());
    assert!(!auth.is_authenticated().await);
}

#[tokio::test]
async fn server_error_keeps_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sessions/s1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let api = logged_in_client(&config).await;

    let err = api.get_session("s1").await.unwrap_err();
    assert!(
        matches!(&err, ClientError::Status { status: 503, body } if body == "maintenance"),
        "got {err:?}"
    );
    assert!(api.auth().is_authenticated().await);
}

#[tokio::test]
async fn login_persists_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "alias": "kim", "pin": "1234" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "access_token": "fresh",
                "user": { "id": "p1", "alias": "kim", "role": "PATIENT" }
            }
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileTokenStore::new(dir.path().join("auth.json")));
    let api = ApiClient::new(&config_for(&server), AuthSession::new(store.clone())).unwrap();

    let user = api.login("kim", "1234").await.unwrap();
    assert_eq!(user.role, Role::Patient);
    assert_eq!(store.load().unwrap().map(|s| s.access_token), Some("fresh".to_string()));

    // A fresh process restores the same login.
    let restored = AuthSession::new(store.clone());
    assert_eq!(restored.restore().await.unwrap().map(|u| u.id), Some("p1".to_string()));

    api.logout().await.unwrap();
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn register_signs_up_then_logs_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .and(body_json(json!({ "alias": "dr-lee", "pin": "0000", "role": "PSYCHOLOGIST" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "access_token": "t",
                "user": { "id": "d1", "alias": "dr-lee", "role": "PSYCHOLOGIST" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&config_for(&server), AuthSession::in_memory()).unwrap();
    let user = api.register("dr-lee", "0000", SignupRole::Psychologist).await.unwrap();

    assert_eq!(user.id, "d1");
    assert!(api.auth().is_authenticated().await);
}

#[tokio::test]
async fn status_update_and_demo_minutes() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/sessions/s1/status"))
        .and(body_json(json!({ "status": "LIVE" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/demo-minutes/psychologist/d1"))
        .and(query_param("patientId", "p1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "minutesRemaining": 15 } })),
        )
        .mount(&server)
        .await;

    let config = config_for(&server);
    let api = logged_in_client(&config).await;

    api.update_session_status("s1", SessionStatus::Live).await.unwrap();
    let minutes = api.get_demo_minutes("d1", "p1").await.unwrap();
    assert_eq!(minutes.minutes_remaining, 15);
}

#[tokio::test]
async fn unexpected_demo_minutes_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/demo-minutes/psychologist/d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "x" })))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let api = logged_in_client(&config).await;

    let err = api.get_demo_minutes("d1", "p1").await.unwrap_err();
    assert!(matches!(err, ClientError::Http(_)), "got {err:?}");
}
