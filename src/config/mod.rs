use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub client: ClientConfig,
    pub server: ServerConfig,
    pub guard: GuardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Settings for the HTTP client side of the wallet session flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

/// Settings for the reference session service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub session_ttl_secs: u64,
    pub cookie_secure: bool,
    pub max_assertion_age_secs: u64,
    pub cors_origins: Vec<String>,
}

/// Timings for the connector compatibility guard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    pub disconnect_debounce_ms: u64,
    pub reconnect_warning_ms: u64,
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Client pointed at an arbitrary base URL with the default 30 second deadline
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_ttl_secs as i64)
    }

    pub fn max_assertion_age(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.max_assertion_age_secs as i64)
    }
}

impl GuardConfig {
    pub fn disconnect_debounce(&self) -> Duration {
        Duration::from_millis(self.disconnect_debounce_ms)
    }

    pub fn reconnect_warning_after(&self) -> Duration {
        Duration::from_millis(self.reconnect_warning_ms)
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            disconnect_debounce_ms: 10_000,
            reconnect_warning_ms: 15_000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Client overrides
        if let Ok(v) = env::var("WALLET_API_BASE_URL") {
            self.client.base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("WALLET_REQUEST_TIMEOUT_SECS") {
            self.client.request_timeout_secs = v.parse().unwrap_or(self.client.request_timeout_secs);
        }

        // Server overrides
        if let Some(port) = env::var("WALLET_SERVER_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("WALLET_SESSION_TTL_SECS") {
            self.server.session_ttl_secs = v.parse().unwrap_or(self.server.session_ttl_secs);
        }
        if let Ok(v) = env::var("WALLET_COOKIE_SECURE") {
            self.server.cookie_secure = v.parse().unwrap_or(self.server.cookie_secure);
        }
        if let Ok(v) = env::var("WALLET_MAX_ASSERTION_AGE_SECS") {
            self.server.max_assertion_age_secs = v.parse().unwrap_or(self.server.max_assertion_age_secs);
        }
        if let Ok(v) = env::var("WALLET_CORS_ORIGINS") {
            self.server.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Guard overrides
        if let Ok(v) = env::var("GUARD_DISCONNECT_DEBOUNCE_MS") {
            self.guard.disconnect_debounce_ms = v.parse().unwrap_or(self.guard.disconnect_debounce_ms);
        }
        if let Ok(v) = env::var("GUARD_RECONNECT_WARNING_MS") {
            self.guard.reconnect_warning_ms = v.parse().unwrap_or(self.guard.reconnect_warning_ms);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            client: ClientConfig {
                base_url: "http://127.0.0.1:3000".to_string(),
                request_timeout_secs: 30,
            },
            server: ServerConfig {
                port: 3000,
                session_ttl_secs: 24 * 60 * 60,
                cookie_secure: false,
                max_assertion_age_secs: 10 * 60,
                cors_origins: Vec::new(),
            },
            guard: GuardConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            client: ClientConfig {
                base_url: "https://staging.example.com".to_string(),
                request_timeout_secs: 30,
            },
            server: ServerConfig {
                port: 8080,
                session_ttl_secs: 12 * 60 * 60,
                cookie_secure: true,
                max_assertion_age_secs: 5 * 60,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            guard: GuardConfig::default(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            client: ClientConfig {
                base_url: "https://app.example.com".to_string(),
                request_timeout_secs: 30,
            },
            server: ServerConfig {
                port: 8080,
                session_ttl_secs: 4 * 60 * 60,
                cookie_secure: true,
                max_assertion_age_secs: 5 * 60,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            guard: GuardConfig::default(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(!config.server.cookie_secure);
        assert_eq!(config.client.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.guard.disconnect_debounce(), Duration::from_secs(10));
        assert_eq!(config.guard.reconnect_warning_after(), Duration::from_secs(15));
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.server.cookie_secure);
        assert!(config.client.base_url.starts_with("https://"));
        assert_eq!(config.server.cors_origins.len(), 1);
    }
}
