use reqwest::RequestBuilder;
use tokio::sync::RwLock;

use crate::api::CSRF_HEADER;

/// Whether a request carries the cached CSRF token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrfPolicy {
    Attach,
    /// Only for calls that precede token issuance or are exempt by policy
    Skip,
}

/// Holds the session's CSRF token and decorates outgoing requests with it
#[derive(Debug, Default)]
pub struct CsrfGuard {
    token: RwLock<Option<String>>,
}

impl CsrfGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, token: String) {
        *self.token.write().await = Some(token);
    }

    pub async fn clear(&self) {
        *self.token.write().await = None;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Attach `x-csrf-token` unless the policy skips it.
    ///
    /// Without a cached token the request goes out bare and the service
    /// answers with the authoritative rejection.
    pub async fn decorate(&self, builder: RequestBuilder, policy: CsrfPolicy) -> RequestBuilder {
        if policy == CsrfPolicy::Skip {
            return builder;
        }
        match self.token.read().await.as_deref() {
            Some(token) => builder.header(CSRF_HEADER, token),
            None => {
                tracing::debug!("No CSRF token cached; sending protected request without one");
                builder
            }
        }
    }
}
