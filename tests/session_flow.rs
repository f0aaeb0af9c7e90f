//! Session behaviour against the in-process mock server.

mod support;

use reqwest::Method;

use appsmith_ops::Error;
use appsmith_ops::appsmith::{RequestOptions, SessionClient, is_anonymous};
use appsmith_ops::config::{AppsmithConfig, Credentials};

use support::MockAppsmith;

#[tokio::test]
async fn test_ensure_logged_in_twice_logs_in_once() {
    let mock = MockAppsmith::new();
    let base = mock.spawn().await;
    let session = SessionClient::new(support::config(&base)).unwrap();

    let first = session.ensure_logged_in().await.unwrap();
    assert!(!is_anonymous(&first));
    let second = session.ensure_logged_in().await.unwrap();
    assert!(!is_anonymous(&second));

    assert_eq!(mock.state().logins, 1);
}

#[tokio::test]
async fn test_token_is_issued_by_identity_probe() {
    let mock = MockAppsmith::new();
    let base = mock.spawn().await;
    let session = SessionClient::new(support::config(&base)).unwrap();

    assert_eq!(session.xsrf_token(), None);
    let token = session.ensure_token().await.unwrap();
    assert_eq!(token, "tok-1");
    assert_eq!(session.xsrf_token().as_deref(), Some("tok-1"));
}

#[tokio::test]
async fn test_forbidden_response_becomes_api_error() {
    let mock = MockAppsmith::new();
    let base = mock.spawn().await;
    let session = SessionClient::new(support::config(&base)).unwrap();

    let err = session
        .request(Method::GET, "/api/v1/forbidden", RequestOptions::new())
        .await
        .unwrap_err();

    let Error::Api(api_err) = &err else {
        panic!("expected ApiError, got {err:?}");
    };
    assert_eq!(api_err.status, 403);
    assert_eq!(api_err.method, "GET");
    assert!(api_err.is_client_error());
    let msg = err.to_string();
    assert!(msg.contains("403"), "{msg}");
    assert!(msg.contains("forbidden"), "{msg}");
}

#[tokio::test]
async fn test_error_body_preview_is_truncated() {
    let mock = MockAppsmith::new();
    let base = mock.spawn().await;
    let session = SessionClient::new(support::config(&base)).unwrap();

    let err = session
        .request(Method::GET, "/api/v1/boom", RequestOptions::new())
        .await
        .unwrap_err();
    let Error::Api(api_err) = err else {
        panic!("expected ApiError");
    };
    assert!(api_err.is_server_error());
    assert!(api_err.body_preview.ends_with("... (truncated)"));
    assert_eq!(
        api_err.body_preview.chars().count(),
        1500 + "... (truncated)".len()
    );
}

#[tokio::test]
async fn test_missing_token_cookie_is_protocol_error() {
    let mock = MockAppsmith::new();
    mock.state().issue_xsrf = false;
    let base = mock.spawn().await;
    let session = SessionClient::new(support::config(&base)).unwrap();

    let err = session.ensure_token().await.unwrap_err();
    assert!(matches!(err, Error::Protocol { .. }), "{err:?}");

    let err = session.login().await.unwrap_err();
    assert!(matches!(err, Error::Protocol { .. }), "{err:?}");
    assert_eq!(mock.state().logins, 0);
}

#[tokio::test]
async fn test_rejected_credentials_are_auth_error() {
    let mock = MockAppsmith::new();
    let base = mock.spawn().await;
    let config = AppsmithConfig::new(&base)
        .unwrap()
        .with_credentials(Credentials::new(support::EMAIL, "wrong"));
    let session = SessionClient::new(config).unwrap();

    let err = session.ensure_logged_in().await.unwrap_err();
    assert!(matches!(err, Error::Auth { .. }), "{err:?}");
    assert_eq!(mock.state().logins, 1);
}

#[tokio::test]
async fn test_anonymous_without_credentials_is_config_error() {
    let mock = MockAppsmith::new();
    let base = mock.spawn().await;
    let session = SessionClient::new(AppsmithConfig::new(&base).unwrap()).unwrap();

    let who = session.whoami().await.unwrap();
    assert!(is_anonymous(&who));

    let err = session.ensure_logged_in().await.unwrap_err();
    assert!(matches!(err, Error::Config(_)), "{err:?}");
    assert_eq!(mock.state().logins, 0);
}

#[tokio::test]
async fn test_health_needs_no_login() {
    let mock = MockAppsmith::new();
    let base = mock.spawn().await;
    let session = SessionClient::new(AppsmithConfig::new(&base).unwrap()).unwrap();

    let health = session.health().await.unwrap();
    assert_eq!(health["data"], "ok");
}

#[tokio::test]
async fn test_expired_session_logs_in_again() {
    let mock = MockAppsmith::new();
    let base = mock.spawn().await;
    let api = support::api(&base);

    api.list_pages("app-1").await.unwrap();
    assert_eq!(mock.state().logins, 1);

    mock.expire_session();
    let pages = api.list_pages("app-1").await.unwrap();
    assert!(pages["data"]["pages"].is_array());
    assert_eq!(mock.state().logins, 2);
    assert_eq!(mock.state().session.as_deref(), Some("s-2"));
}
