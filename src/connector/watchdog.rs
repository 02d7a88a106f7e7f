use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{CompatibilityGuard, ConnectionSnapshot, Disconnector, GuardAction};
use crate::config::GuardConfig;

/// Drives a [`CompatibilityGuard`] from the wallet library's connection feed.
///
/// Runs until the feed's sender is dropped, then hands the guard back.
pub struct ConnectorWatchdog<D> {
    guard: CompatibilityGuard,
    feed: watch::Receiver<ConnectionSnapshot>,
    disconnector: D,
}

impl<D: Disconnector + 'static> ConnectorWatchdog<D> {
    pub fn new(config: &GuardConfig, feed: watch::Receiver<ConnectionSnapshot>, disconnector: D) -> Self {
        Self {
            guard: CompatibilityGuard::new(config),
            feed,
            disconnector,
        }
    }

    pub fn spawn(self) -> JoinHandle<CompatibilityGuard> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) -> CompatibilityGuard {
        let initial = self.feed.borrow_and_update().clone();
        self.handle(initial).await;

        loop {
            let deadline = self.guard.reconnect_deadline();
            tokio::select! {
                changed = self.feed.changed() => {
                    if changed.is_err() {
                        tracing::debug!("Connection feed closed; stopping connector watchdog");
                        break;
                    }
                    let snapshot = self.feed.borrow_and_update().clone();
                    self.handle(snapshot).await;
                }
                _ = wait_until(deadline) => {
                    self.guard.poll_reconnect(Instant::now());
                }
            }
        }

        self.guard
    }

    async fn handle(&mut self, snapshot: ConnectionSnapshot) {
        let action = self
            .guard
            .observe(snapshot.status, snapshot.connector.as_deref(), Instant::now());

        if action == GuardAction::ForceDisconnect {
            if let Err(e) = self.disconnector.disconnect().await {
                tracing::warn!("Forced disconnect failed: {}", e);
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{ConnectionStatus, Connector};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct LegacyConnector;

    impl Connector for LegacyConnector {
        fn id(&self) -> &str {
            "legacy-injected"
        }

        fn supports_chain_id_query(&self) -> bool {
            false
        }
    }

    #[derive(Default)]
    struct CountingDisconnector {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Disconnector for CountingDisconnector {
        async fn disconnect(&self) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingDisconnector;

    #[async_trait]
    impl Disconnector for FailingDisconnector {
        async fn disconnect(&self) -> anyhow::Result<()> {
            anyhow::bail!("wallet library refused")
        }
    }

    fn stale_connected() -> ConnectionSnapshot {
        ConnectionSnapshot::new(ConnectionStatus::Connected, Some(Arc::new(LegacyConnector)))
    }

    fn status(status: ConnectionStatus) -> ConnectionSnapshot {
        ConnectionSnapshot::new(status, None)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_stale_notifications_disconnect_once() {
        let disconnector = Arc::new(CountingDisconnector::default());
        let (tx, rx) = watch::channel(ConnectionSnapshot::default());
        let handle = ConnectorWatchdog::new(&GuardConfig::default(), rx, disconnector.clone()).spawn();

        tx.send(stale_connected()).unwrap();
        settle().await;
        tx.send(stale_connected()).unwrap();
        settle().await;
        assert_eq!(disconnector.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        tx.send(stale_connected()).unwrap();
        settle().await;
        assert_eq!(disconnector.calls.load(Ordering::SeqCst), 2);

        drop(tx);
        let guard = handle.await.unwrap();
        assert_eq!(guard.forced_disconnects(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_reconnect_warns_once_and_rearms_after_recovery() {
        let (tx, rx) = watch::channel(status(ConnectionStatus::Connected));
        let handle =
            ConnectorWatchdog::new(&GuardConfig::default(), rx, Arc::new(CountingDisconnector::default())).spawn();

        tx.send(status(ConnectionStatus::Reconnecting)).unwrap();
        tokio::time::sleep(Duration::from_secs(40)).await;

        tx.send(status(ConnectionStatus::Connected)).unwrap();
        settle().await;

        tx.send(status(ConnectionStatus::Reconnecting)).unwrap();
        tokio::time::sleep(Duration::from_secs(16)).await;

        drop(tx);
        let guard = handle.await.unwrap();
        assert_eq!(guard.reconnect_warnings(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn short_reconnect_is_silent() {
        let (tx, rx) = watch::channel(status(ConnectionStatus::Reconnecting));
        let handle =
            ConnectorWatchdog::new(&GuardConfig::default(), rx, Arc::new(CountingDisconnector::default())).spawn();

        tokio::time::sleep(Duration::from_secs(5)).await;
        tx.send(status(ConnectionStatus::Connected)).unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;

        drop(tx);
        let guard = handle.await.unwrap();
        assert_eq!(guard.reconnect_warnings(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_failures_are_soft() {
        let (tx, rx) = watch::channel(stale_connected());
        let handle = ConnectorWatchdog::new(&GuardConfig::default(), rx, FailingDisconnector).spawn();

        settle().await;
        drop(tx);
        let guard = handle.await.unwrap();
        assert_eq!(guard.forced_disconnects(), 1);
    }
}
