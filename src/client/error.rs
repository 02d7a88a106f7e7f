use reqwest::StatusCode;
use thiserror::Error;

/// How a rejected request should be read by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 403: blocked before business logic; re-bootstrap before retrying
    CsrfRejected,
    /// 401: token was fine but there is no valid session or signature
    AuthFailure,
    Other,
}

impl FailureKind {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::FORBIDDEN => FailureKind::CsrfRejected,
            StatusCode::UNAUTHORIZED => FailureKind::AuthFailure,
            _ => FailureKind::Other,
        }
    }
}

/// Request-layer failure. Transport details are logged, never displayed.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Request timed out. Please try again.")]
    Timeout,

    #[error("Network error. Please check your connection and try again.")]
    Network,

    #[error("Request failed with status {0}")]
    Status(StatusCode),

    #[error("Unexpected response from server.")]
    Decode,

    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl RequestError {
    /// Map a transport error to a generic, user-facing variant
    pub fn from_transport(err: reqwest::Error) -> Self {
        tracing::debug!("Request transport failure: {}", err);
        if err.is_timeout() {
            RequestError::Timeout
        } else if err.is_decode() {
            RequestError::Decode
        } else {
            RequestError::Network
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RequestError::Status(status) => Some(*status),
            _ => None,
        }
    }

    pub fn failure_kind(&self) -> FailureKind {
        self.status()
            .map(FailureKind::from_status)
            .unwrap_or(FailureKind::Other)
    }

    pub fn is_csrf_rejected(&self) -> bool {
        self.failure_kind() == FailureKind::CsrfRejected
    }

    pub fn is_auth_failure(&self) -> bool {
        self.failure_kind() == FailureKind::AuthFailure
    }
}

/// No CSRF token could be obtained. Authenticated actions are blocked until a retry succeeds.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Session bootstrap failed: {0}")]
    Request(#[from] RequestError),

    #[error("Session bootstrap failed: response did not include a CSRF token")]
    MissingToken,
}
