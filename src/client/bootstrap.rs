use reqwest::Method;

use super::{ApiClient, BootstrapError, CsrfGuard, CsrfPolicy};
use crate::api::SESSION_STATUS_PATH;
use crate::types::SessionStatus;

/// Fetch session status without a CSRF token and cache the token it returns.
///
/// The service establishes the cookie-backed session on this call. Any
/// failure, including a payload without a usable token, leaves the guard
/// untouched.
pub async fn bootstrap(client: &ApiClient, guard: &CsrfGuard) -> Result<SessionStatus, BootstrapError> {
    let status: SessionStatus = client
        .send::<(), _>(Method::GET, SESSION_STATUS_PATH, None, guard, CsrfPolicy::Skip)
        .await?;

    let token = status
        .csrf_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(BootstrapError::MissingToken)?;

    guard.set(token.to_string()).await;
    tracing::info!(
        "Session bootstrapped (authenticated: {}, address: {})",
        status.authenticated,
        status.address.as_deref().unwrap_or("none")
    );

    Ok(status)
}
