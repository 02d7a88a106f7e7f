//! Wire types shared by the client and the session service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Success envelope used by every JSON endpoint: `{ "success": true, "data": ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
}

/// Payload of `GET /api/v1/wallet/session-status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// Absent or empty means the service did not issue a token
    #[serde(default)]
    pub csrf_token: Option<String>,
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Wallet auth assertion submitted to `POST /api/v1/wallet/connect`.
///
/// Proves control of the private key behind `address`. The client never
/// validates it; the session service recovers the signer from `signature`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAuthAssertion {
    pub address: String,
    pub signature: String,
    /// Milliseconds since the Unix epoch at signing time
    pub timestamp: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl WalletAuthAssertion {
    pub fn new(
        address: impl Into<String>,
        signature: impl Into<String>,
        message: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            address: address.into(),
            signature: signature.into(),
            timestamp,
            message: message.into(),
            token: None,
        }
    }

    /// Assertion stamped with the current wall clock
    pub fn now(
        address: impl Into<String>,
        signature: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(address, signature, message, Utc::now().timestamp_millis())
    }
}

/// Line of a sign-in message that carries the signing time in milliseconds
pub const TIMESTAMP_LINE: &str = "timestamp:";

/// Sign-in text for `statement`, binding `timestamp` into what the wallet signs
pub fn sign_in_message(statement: &str, timestamp: i64) -> String {
    format!("{}\n{} {}", statement, TIMESTAMP_LINE, timestamp)
}

/// The signed timestamp of a sign-in message, if it has one
pub fn message_timestamp(message: &str) -> Option<i64> {
    message
        .lines()
        .find_map(|line| line.trim().strip_prefix(TIMESTAMP_LINE))
        .and_then(|value| value.trim().parse().ok())
}

/// Payload of a successful connect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResult {
    pub address: String,
    pub authenticated: bool,
    #[serde(default)]
    pub csrf_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Payload of a successful logout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResult {
    pub logged_out: bool,
}

/// Payload of `GET /healthz`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    pub uptime_seconds: u64,
    #[serde(default)]
    pub rss_kb: Option<u64>,
    pub timestamp: DateTime<Utc>,
}
