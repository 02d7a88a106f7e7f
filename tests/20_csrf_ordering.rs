mod common;

use anyhow::Result;
use reqwest::StatusCode;
use wallet_session::api::{CSRF_HEADER, LOGOUT_PATH, SESSION_STATUS_PATH};
use wallet_session::client::FailureKind;

async fn bootstrap_token(client: &reqwest::Client, server: &common::TestServer) -> Result<String> {
    let body = client
        .get(server.url(SESSION_STATUS_PATH))
        .send()
        .await?
        .json::<serde_json::Value>()
        .await?;
    Ok(body["data"]["csrfToken"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn logout_before_bootstrap_is_csrf_rejected() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = server.cookie_client()?;

    let res = client.post(server.url(LOGOUT_PATH)).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn session_cookie_without_token_is_csrf_rejected() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = server.cookie_client()?;
    bootstrap_token(&client, &server).await?;

    let res = client.post(server.url(LOGOUT_PATH)).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(server.url(LOGOUT_PATH))
        .header(CSRF_HEADER, "not-the-token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn token_from_another_session_is_csrf_rejected() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let alice = server.cookie_client()?;
    let mallory = server.cookie_client()?;

    let alice_token = bootstrap_token(&alice, &server).await?;
    bootstrap_token(&mallory, &server).await?;

    let res = mallory
        .post(server.url(LOGOUT_PATH))
        .header(CSRF_HEADER, alice_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn valid_token_without_connect_is_auth_failure() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = server.cookie_client()?;
    let token = bootstrap_token(&client, &server).await?;

    let res = client
        .post(server.url(LOGOUT_PATH))
        .header(CSRF_HEADER, token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn client_classifies_rejections_by_status() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let session = server.session()?;

    // No token yet: the guard sends the request bare and the service refuses it
    let err = session.logout().await.unwrap_err();
    assert_eq!(err.failure_kind(), FailureKind::CsrfRejected);

    session.bootstrap().await?;
    let err = session.logout().await.unwrap_err();
    assert_eq!(err.failure_kind(), FailureKind::AuthFailure);
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));

    // A rejected logout leaves the cached token alone
    assert!(session.is_bootstrapped().await);
    Ok(())
}
