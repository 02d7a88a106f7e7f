//! Reference implementation of the wallet session service.
//!
//! Issues cookie-backed sessions with a CSRF token, upgrades them on a valid
//! wallet signature and destroys them on logout. CSRF is checked before
//! authentication on every protected route.

pub mod store;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::api::{CONNECT_PATH, CSRF_HEADER, HEALTH_PATH, LOGOUT_PATH, SESSION_STATUS_PATH};
use crate::config::ServerConfig;
use crate::handlers::{health, wallet};
use crate::middleware::csrf_middleware;

pub use store::{Session, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub config: Arc<ServerConfig>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            sessions: SessionStore::new(config.session_ttl(), config.max_assertion_age()),
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }
}

pub fn app(state: AppState) -> Router {
    // CSRF first, then the handler checks authentication
    let protected = Router::new()
        .route(LOGOUT_PATH, post(wallet::logout))
        .route_layer(middleware::from_fn_with_state(state.clone(), csrf_middleware));

    let router = Router::new()
        .route(HEALTH_PATH, get(health::healthz))
        .route(SESSION_STATUS_PATH, get(wallet::session_status))
        .route(CONNECT_PATH, post(wallet::connect))
        .merge(protected)
        .layer(TraceLayer::new_for_http());

    let router = match cors_layer(&state.config) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.with_state(state)
}

/// Credentialed CORS for the configured origins; none configured means same-origin only
fn cors_layer(config: &ServerConfig) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(CSRF_HEADER)]),
    )
}

/// Serve the session service on an already-bound listener
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, app(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    fn test_config() -> ServerConfig {
        ServerConfig {
            port: 0,
            session_ttl_secs: 3600,
            cookie_secure: false,
            max_assertion_age_secs: 300,
            cors_origins: Vec::new(),
        }
    }

    #[tokio::test]
    async fn logout_without_cookie_is_csrf_rejected() {
        let app = app(AppState::new(test_config()));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(LOGOUT_PATH)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn session_status_sets_cookie() {
        let app = app(AppState::new(test_config()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri(SESSION_STATUS_PATH)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(cookie.starts_with("wallet_session="));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn cors_is_disabled_without_origins() {
        assert!(cors_layer(&test_config()).is_none());

        let mut config = test_config();
        config.cors_origins = vec!["https://app.example.com".to_string()];
        assert!(cors_layer(&config).is_some());
    }
}
