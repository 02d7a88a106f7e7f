//! Client side of the wallet session flow.
//!
//! [`ApiClient`] is the request helper: a cookie-carrying reqwest client with
//! a fixed per-request deadline. [`WalletSession`] composes it with the CSRF
//! guard, the bootstrapper and the connect flow.

pub mod bootstrap;
pub mod connect;
pub mod csrf;
pub mod error;
pub mod session;

use reqwest::{Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::config::ClientConfig;
use crate::types::Envelope;

pub use csrf::{CsrfGuard, CsrfPolicy};
pub use error::{BootstrapError, FailureKind, RequestError};
pub use session::WalletSession;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        // Cookie store plays the role of `credentials: include`
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send a JSON request and unwrap the `{success, data}` envelope.
    ///
    /// Non-2xx statuses become [`RequestError::Status`]; the body of a
    /// rejection is not interpreted.
    pub async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        guard: &CsrfGuard,
        policy: CsrfPolicy,
    ) -> Result<T, RequestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.dispatch(method, path, body, guard, policy).await?;
        let envelope: Envelope<T> = response.json().await.map_err(RequestError::from_transport)?;
        envelope.data.ok_or(RequestError::Decode)
    }

    async fn dispatch<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        guard: &CsrfGuard,
        policy: CsrfPolicy,
    ) -> Result<Response, RequestError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.base_url.join(path)?;
        let mut builder = self.http.request(method.clone(), url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let builder = guard.decorate(builder, policy).await;

        let response = builder.send().await.map_err(RequestError::from_transport)?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!("{} {} rejected with {}", method, path, status);
            return Err(RequestError::Status(status));
        }
        Ok(response)
    }
}
