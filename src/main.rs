use std::time::Duration;

use tracing_subscriber::EnvFilter;
use wallet_session::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up WALLET_* settings
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = wallet_session::config::config();
    tracing::info!("Starting wallet session service in {:?} mode", config.environment);
    if wallet_session::is_production!() && !config.server.cookie_secure {
        tracing::warn!("Session cookies are not marked Secure in production");
    }

    let state = AppState::new(config.server.clone());
    spawn_session_sweeper(state.clone());

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Wallet session service listening on http://{}", bind_addr);

    server::serve(listener, state).await?;
    Ok(())
}

/// Drop expired sessions every minute so the table does not grow without bound
fn spawn_session_sweeper(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let purged = state.sessions.purge_expired().await;
            if purged > 0 {
                tracing::debug!("Purged {} expired sessions", purged);
            }
        }
    });
}
