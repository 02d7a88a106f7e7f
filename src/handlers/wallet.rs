// handlers/wallet.rs - session-status, connect and logout

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};

use crate::api::SESSION_COOKIE;
use crate::eip191;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, CurrentSession};
use crate::server::{AppState, Session};
use crate::types::{message_timestamp, ConnectResult, LogoutResult, SessionStatus, WalletAuthAssertion};

/// GET /api/v1/wallet/session-status
///
/// Returns the caller's session, creating one (and its CSRF token) when the
/// cookie is missing, unknown or expired. Never requires a CSRF token.
///
/// ```json
/// { "success": true, "data": { "csrfToken": "9f2c...", "authenticated": false, "address": null, "expiresAt": "..." } }
/// ```
pub async fn session_status(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, ApiResponse<SessionStatus>) {
    let (session, jar) = match existing_session(&state, &jar).await {
        Some(session) => (session, jar),
        None => {
            let session = state.sessions.create().await;
            let jar = jar.add(session_cookie(&session.id, state.config.cookie_secure));
            (session, jar)
        }
    };

    let status = SessionStatus {
        csrf_token: Some(session.csrf_token),
        authenticated: session.authenticated,
        address: session.address,
        expires_at: Some(session.expires_at),
    };

    (jar, ApiResponse::success(status))
}

/// POST /api/v1/wallet/connect
///
/// Exchanges a wallet-signed message for an authenticated session. Exempt
/// from CSRF so it is reachable before bootstrap. The message must carry the
/// assertion's timestamp on its `timestamp:` line so the signature covers it.
/// Every failure, including an unreadable body, is a 401 and leaves no
/// authenticated session behind. A successful connect moves the session to a
/// fresh id.
pub async fn connect(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<WalletAuthAssertion>, JsonRejection>,
) -> Result<(CookieJar, ApiResponse<ConnectResult>), ApiError> {
    let Json(assertion) = payload.map_err(|rejection| {
        tracing::warn!("Unreadable wallet assertion: {}", rejection.body_text());
        verification_failed()
    })?;

    if assertion.message.trim().is_empty() {
        tracing::warn!("Wallet assertion for {} rejected: empty message", assertion.address);
        return Err(verification_failed());
    }

    if message_timestamp(&assertion.message) != Some(assertion.timestamp) {
        tracing::warn!(
            "Wallet assertion for {} rejected: message does not sign timestamp {}",
            assertion.address,
            assertion.timestamp
        );
        return Err(verification_failed());
    }

    let asserted_at = DateTime::<Utc>::from_timestamp_millis(assertion.timestamp).ok_or_else(verification_failed)?;
    let age = (Utc::now() - asserted_at).abs();
    if age > state.config.max_assertion_age() {
        tracing::warn!(
            "Wallet assertion for {} rejected: timestamp is {}s away from server time",
            assertion.address,
            age.num_seconds()
        );
        return Err(verification_failed());
    }

    let address = eip191::verify_signature(&assertion.message, &assertion.signature, &assertion.address)?;
    let canonical = eip191::canonical_signature(&assertion.signature)?;

    if !state.sessions.consume_signature(&canonical, asserted_at).await {
        tracing::warn!("Replayed wallet assertion for {}", address);
        return Err(verification_failed());
    }

    let current = match existing_session(&state, &jar).await {
        Some(session) => session,
        None => state.sessions.create().await,
    };
    let session = state
        .sessions
        .authenticate(&current.id, &address)
        .await
        .ok_or_else(|| ApiError::internal_server_error("Session expired during connect"))?;
    let jar = jar.add(session_cookie(&session.id, state.config.cookie_secure));

    tracing::info!("Wallet {} connected on session {}", address, session.id);

    Ok((
        jar,
        ApiResponse::success(ConnectResult {
            address,
            authenticated: true,
            csrf_token: Some(session.csrf_token),
            expires_at: Some(session.expires_at),
        }),
    ))
}

/// POST /api/v1/wallet/logout
///
/// Behind the CSRF middleware. A valid token on an unauthenticated session
/// is an authentication failure, not a CSRF failure.
pub async fn logout(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<LogoutResult>), ApiError> {
    if !session.authenticated {
        return Err(ApiError::unauthorized("No authenticated session"));
    }

    state.sessions.destroy(&session.id).await;
    tracing::info!(
        "Wallet {} logged out of session {}",
        session.address.as_deref().unwrap_or("unknown"),
        session.id
    );

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, ApiResponse::success(LogoutResult { logged_out: true })))
}

fn verification_failed() -> ApiError {
    ApiError::unauthorized("Wallet signature verification failed")
}

async fn existing_session(state: &AppState, jar: &CookieJar) -> Option<Session> {
    let cookie = jar.get(SESSION_COOKIE)?;
    state.sessions.get(cookie.value()).await
}

fn session_cookie(id: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .build()
}
