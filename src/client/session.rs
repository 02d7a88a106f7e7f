use async_trait::async_trait;
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;

use super::{bootstrap, connect, ApiClient, BootstrapError, CsrfGuard, CsrfPolicy, RequestError};
use crate::api::{HEALTH_PATH, LOGOUT_PATH};
use crate::config::ClientConfig;
use crate::connector::Disconnector;
use crate::types::{ConnectResult, HealthReport, LogoutResult, SessionStatus, WalletAuthAssertion};

/// Page-lifetime wallet session: one cookie jar, one cached CSRF token.
///
/// Bootstrap once, then connect and issue protected calls. Safe to share
/// through `Arc`; each call is a single outstanding request.
pub struct WalletSession {
    client: ApiClient,
    csrf: CsrfGuard,
    address: RwLock<Option<String>>,
}

impl WalletSession {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        Ok(Self::from_client(ApiClient::new(config)?))
    }

    pub fn from_client(client: ApiClient) -> Self {
        Self {
            client,
            csrf: CsrfGuard::new(),
            address: RwLock::new(None),
        }
    }

    pub async fn bootstrap(&self) -> Result<SessionStatus, BootstrapError> {
        let status = bootstrap::bootstrap(&self.client, &self.csrf).await?;
        *self.address.write().await = status.address.clone().filter(|_| status.authenticated);
        Ok(status)
    }

    pub async fn connect(&self, assertion: &WalletAuthAssertion) -> Result<ConnectResult, RequestError> {
        let result = connect::connect(&self.client, &self.csrf, assertion).await?;
        *self.address.write().await = Some(result.address.clone());
        Ok(result)
    }

    /// Destroy the server session. The cached token dies with it.
    pub async fn logout(&self) -> Result<LogoutResult, RequestError> {
        let result: LogoutResult = self.post_protected::<(), _>(LOGOUT_PATH, None).await?;
        self.reset().await;
        tracing::info!("Wallet session logged out");
        Ok(result)
    }

    /// Any state-changing call; always carries the CSRF token
    pub async fn post_protected<B, T>(&self, path: &str, body: Option<&B>) -> Result<T, RequestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.client
            .send(Method::POST, path, body, &self.csrf, CsrfPolicy::Attach)
            .await
    }

    pub async fn health(&self) -> Result<HealthReport, RequestError> {
        self.client
            .send::<(), _>(Method::GET, HEALTH_PATH, None, &self.csrf, CsrfPolicy::Skip)
            .await
    }

    pub async fn csrf_token(&self) -> Option<String> {
        self.csrf.token().await
    }

    pub async fn address(&self) -> Option<String> {
        self.address.read().await.clone()
    }

    pub async fn is_bootstrapped(&self) -> bool {
        self.csrf.token().await.is_some()
    }

    async fn reset(&self) {
        self.csrf.clear().await;
        *self.address.write().await = None;
    }
}

/// Forced disconnect from the connector watchdog: drop to unauthenticated.
///
/// A 401/403 means the server already has no authenticated session for us,
/// which is the state we want; local state is cleared either way.
#[async_trait]
impl Disconnector for WalletSession {
    async fn disconnect(&self) -> anyhow::Result<()> {
        let outcome = self.logout().await;
        self.reset().await;
        match outcome {
            Ok(_) => Ok(()),
            Err(e) if e.is_auth_failure() || e.is_csrf_rejected() => {
                tracing::debug!("Forced disconnect found no server session ({})", e);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
