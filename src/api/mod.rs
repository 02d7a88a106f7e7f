//! Paths, header and cookie names shared by the client and the session service.

pub const SESSION_STATUS_PATH: &str = "/api/v1/wallet/session-status";
pub const CONNECT_PATH: &str = "/api/v1/wallet/connect";
pub const LOGOUT_PATH: &str = "/api/v1/wallet/logout";
pub const HEALTH_PATH: &str = "/healthz";

/// Request header carrying the per-session CSRF token
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Cookie holding the opaque session id
pub const SESSION_COOKIE: &str = "wallet_session";
