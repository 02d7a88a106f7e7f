use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use subtle::ConstantTimeEq;

use crate::api::{CSRF_HEADER, SESSION_COOKIE};
use crate::error::ApiError;
use crate::server::{AppState, Session};

/// Session whose CSRF token matched, injected for downstream handlers
#[derive(Clone, Debug)]
pub struct CurrentSession(pub Session);

/// Reject state-changing requests that do not carry the CSRF token of the caller's session.
///
/// Runs before any authentication check, so a request without a valid token
/// always gets 403 regardless of whether the session is authenticated.
pub async fn csrf_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = match jar.get(SESSION_COOKIE) {
        Some(cookie) => state.sessions.get(cookie.value()).await,
        None => None,
    };
    let Some(session) = session else {
        tracing::debug!("CSRF check failed: no live session for request");
        return Err(ApiError::csrf_rejected());
    };

    let provided = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !tokens_match(provided, &session.csrf_token) {
        tracing::warn!("CSRF check failed for session {}", session.id);
        return Err(ApiError::csrf_rejected());
    }

    request.extensions_mut().insert(CurrentSession(session));
    Ok(next.run(request).await)
}

fn tokens_match(provided: &str, expected: &str) -> bool {
    !provided.is_empty() && bool::from(provided.as_bytes().ct_eq(expected.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_comparison() {
        assert!(tokens_match("abc", "abc"));
        assert!(!tokens_match("abd", "abc"));
        assert!(!tokens_match("ab", "abc"));
        assert!(!tokens_match("", ""));
    }
}
