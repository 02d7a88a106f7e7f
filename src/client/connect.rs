use reqwest::Method;

use super::{ApiClient, CsrfGuard, CsrfPolicy, RequestError};
use crate::api::CONNECT_PATH;
use crate::types::{ConnectResult, WalletAuthAssertion};

/// Submit a wallet-signed assertion to exchange key ownership for an authenticated session.
///
/// Sent without the CSRF header: the endpoint must be reachable before a
/// session exists. The signature is not checked here; a forged one comes back
/// as a 401 ([`RequestError::is_auth_failure`]). One attempt per call.
pub async fn connect(
    client: &ApiClient,
    guard: &CsrfGuard,
    assertion: &WalletAuthAssertion,
) -> Result<ConnectResult, RequestError> {
    let mut body = assertion.clone();
    if body.token.is_none() {
        body.token = guard.token().await;
    }

    let result: ConnectResult = client
        .send(Method::POST, CONNECT_PATH, Some(&body), guard, CsrfPolicy::Skip)
        .await
        .inspect_err(|e| {
            if e.is_auth_failure() {
                tracing::warn!("Wallet connect rejected for {}", assertion.address);
            }
        })?;

    // Connect without a prior bootstrap creates the session and its token here
    if let Some(token) = result.csrf_token.as_deref().filter(|t| !t.is_empty()) {
        guard.set(token.to_string()).await;
    }

    tracing::info!("Wallet {} connected", result.address);
    Ok(result)
}
