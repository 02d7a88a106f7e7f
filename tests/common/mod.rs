#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use tokio::task::JoinHandle;
use wallet_session::client::WalletSession;
use wallet_session::config::{ClientConfig, ServerConfig};
use wallet_session::server::{self, AppState};

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start the session service on an unused port inside the current test runtime
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(server_config()).await
    }

    pub async fn spawn_with(config: ServerConfig) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        let state = AppState::new(config);
        let handle = tokio::spawn(async move {
            let _ = server::serve(listener, state).await;
        });

        let server = Self { port, base_url, handle };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/healthz", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fresh client session with its own cookie jar
    pub fn session(&self) -> Result<WalletSession> {
        WalletSession::new(&ClientConfig::for_base_url(&self.base_url))
    }

    /// Raw reqwest client that keeps cookies between calls
    pub fn cookie_client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder().cookie_store(true).build()?)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn server_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        session_ttl_secs: 3600,
        cookie_secure: false,
        max_assertion_age_secs: 300,
        cors_origins: Vec::new(),
    }
}
