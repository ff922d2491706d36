//! Login, account lookup and session establishment.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fantasy_ledger::api::auth::{establish_session, Credentials};
use fantasy_ledger::config::AppConfig;
use fantasy_ledger::types::SyncError;

use super::{base_url, client, LEAGUE_ID, USER_ID};

fn credentials() -> Credentials {
    Credentials {
        email: "manager@example.com".into(),
        password: SecretString::new("hunter2".into()),
    }
}

fn is_auth_error(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<SyncError>(), Some(SyncError::Authentication(_)))
}

async fn mount_account(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v2/account"))
        .and(header("authorization", "Bearer issued-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "account": {"id": 27957190},
                "leagues": [
                    {"id": 42, "user": {"id": 1}},
                    {"id": LEAGUE_ID, "user": {"id": USER_ID}}
                ]
            }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_returns_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/auth/login"))
        .and(body_json(json!({"email": "manager@example.com", "password": "hunter2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "issued-token"})))
        .expect(1)
        .mount(&server)
        .await;

    let token = client(&server).login(&credentials()).await.unwrap();
    assert_eq!(token.expose_secret(), "issued-token");
}

#[tokio::test]
async fn test_login_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"status": 401})))
        .mount(&server)
        .await;

    let err = client(&server).login(&credentials()).await.unwrap_err();
    assert!(is_auth_error(&err));
}

#[tokio::test]
async fn test_login_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 200})))
        .mount(&server)
        .await;

    let err = client(&server).login(&credentials()).await.unwrap_err();
    assert!(is_auth_error(&err));
}

#[tokio::test]
async fn test_resolve_user_id() {
    let server = MockServer::start().await;
    mount_account(&server).await;

    let token = SecretString::new("issued-token".into());
    let user_id = client(&server).resolve_user_id(&token, LEAGUE_ID).await.unwrap();
    assert_eq!(user_id, USER_ID);

    let err = client(&server).resolve_user_id(&token, 777).await.unwrap_err();
    assert!(is_auth_error(&err));
}

#[tokio::test]
async fn test_establish_session_logs_in_and_resolves_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "issued-token"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_account(&server).await;

    std::env::set_var("FANTASY_LEDGER_IT_EMAIL", "manager@example.com");
    std::env::set_var("FANTASY_LEDGER_IT_PASSWORD", "hunter2");

    let cfg = AppConfig::parse(&format!(
        r#"
        [league]
        id = {LEAGUE_ID}

        [api]
        base_url = "{}"
        email_env = "FANTASY_LEDGER_IT_EMAIL"
        password_env = "FANTASY_LEDGER_IT_PASSWORD"

        [finance]
        starting_balance = 40000000
        reference_floor = 40000000
        "#,
        base_url(&server)
    ))
    .unwrap();

    let session = establish_session(&client(&server), &cfg).await.unwrap();
    assert_eq!(session.league_id, LEAGUE_ID);
    assert_eq!(session.user_id, USER_ID);
    assert_eq!(session.token().expose_secret(), "issued-token");
}

#[tokio::test]
async fn test_establish_session_with_preissued_token_skips_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "unused"})))
        .expect(0)
        .mount(&server)
        .await;

    std::env::set_var("FANTASY_LEDGER_IT_TOKEN", "preissued");

    let cfg = AppConfig::parse(&format!(
        r#"
        [league]
        id = {LEAGUE_ID}
        user_id = {USER_ID}

        [api]
        base_url = "{}"
        token_env = "FANTASY_LEDGER_IT_TOKEN"

        [finance]
        starting_balance = 40000000
        reference_floor = 40000000
        "#,
        base_url(&server)
    ))
    .unwrap();

    let session = establish_session(&client(&server), &cfg).await.unwrap();
    assert_eq!(session.user_id, USER_ID);
    assert_eq!(session.token().expose_secret(), "preissued");
}

#[tokio::test]
async fn test_establish_session_without_credentials_fails_fast() {
    let server = MockServer::start().await;

    let cfg = AppConfig::parse(&format!(
        r#"
        [league]
        id = {LEAGUE_ID}

        [api]
        base_url = "{}"
        email_env = "FANTASY_LEDGER_IT_UNSET_EMAIL"
        password_env = "FANTASY_LEDGER_IT_UNSET_PASSWORD"

        [finance]
        starting_balance = 40000000
        reference_floor = 40000000
        "#,
        base_url(&server)
    ))
    .unwrap();

    let err = establish_session(&client(&server), &cfg).await.unwrap_err();
    assert!(is_auth_error(&err));
}
