//! Wallet connector handles and the compatibility watchdog that guards them.

pub mod guard;
pub mod watchdog;

use std::sync::Arc;

use async_trait::async_trait;

pub use guard::{CompatibilityGuard, GuardAction, GuardPhase};
pub use watchdog::ConnectorWatchdog;

/// Capabilities of the active wallet-provider adapter.
///
/// A connector that cannot answer chain-id queries while the session reports
/// connected is stale and must be discarded.
pub trait Connector: Send + Sync {
    fn id(&self) -> &str;

    fn supports_chain_id_query(&self) -> bool;
}

/// Connection status reported by the wallet library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// One notification from the wallet library
#[derive(Clone, Default)]
pub struct ConnectionSnapshot {
    pub status: ConnectionStatus,
    pub connector: Option<Arc<dyn Connector>>,
}

impl ConnectionSnapshot {
    pub fn new(status: ConnectionStatus, connector: Option<Arc<dyn Connector>>) -> Self {
        Self { status, connector }
    }
}

impl std::fmt::Debug for ConnectionSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSnapshot")
            .field("status", &self.status)
            .field("connector", &self.connector.as_ref().map(|c| c.id().to_string()))
            .finish()
    }
}

/// Performs the forced disconnect the guard asks for
#[async_trait]
pub trait Disconnector: Send + Sync {
    async fn disconnect(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl<T: Disconnector + ?Sized> Disconnector for Arc<T> {
    async fn disconnect(&self) -> anyhow::Result<()> {
        (**self).disconnect().await
    }
}
