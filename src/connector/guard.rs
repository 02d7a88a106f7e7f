use std::time::Duration;

use tokio::time::Instant;

use super::{ConnectionStatus, Connector};
use crate::config::GuardConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPhase {
    Stable,
    Reconnecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardAction {
    None,
    ForceDisconnect,
}

/// Detects stale connectors and stuck reconnections.
///
/// Owns the only mutable timing state of the subsystem: the instant of the
/// last forced disconnect (debounce) and the start of the current
/// reconnection attempt. Every failure here is soft; the guard logs and
/// never returns an error.
#[derive(Debug)]
pub struct CompatibilityGuard {
    debounce: Duration,
    reconnect_warning_after: Duration,
    last_forced_disconnect: Option<Instant>,
    reconnect_started: Option<Instant>,
    reconnect_warned: bool,
    forced_disconnects: u64,
    reconnect_warnings: u64,
}

impl CompatibilityGuard {
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            debounce: config.disconnect_debounce(),
            reconnect_warning_after: config.reconnect_warning_after(),
            last_forced_disconnect: None,
            reconnect_started: None,
            reconnect_warned: false,
            forced_disconnects: 0,
            reconnect_warnings: 0,
        }
    }

    pub fn phase(&self) -> GuardPhase {
        if self.reconnect_started.is_some() {
            GuardPhase::Reconnecting
        } else {
            GuardPhase::Stable
        }
    }

    /// Feed one status notification. Re-entrant notifications are expected.
    pub fn observe(
        &mut self,
        status: ConnectionStatus,
        connector: Option<&dyn Connector>,
        now: Instant,
    ) -> GuardAction {
        if status == ConnectionStatus::Reconnecting {
            if self.reconnect_started.is_none() {
                tracing::debug!("Wallet reconnection started");
                self.reconnect_started = Some(now);
                self.reconnect_warned = false;
            }
        } else if let Some(started) = self.reconnect_started.take() {
            tracing::debug!(
                "Wallet reconnection resolved to {:?} after {:?}",
                status,
                now.saturating_duration_since(started)
            );
            self.reconnect_warned = false;
        }

        match (status, connector) {
            (ConnectionStatus::Connected, Some(connector)) if !connector.supports_chain_id_query() => {
                self.force_disconnect(connector, now)
            }
            _ => GuardAction::None,
        }
    }

    fn force_disconnect(&mut self, connector: &dyn Connector, now: Instant) -> GuardAction {
        if let Some(last) = self.last_forced_disconnect {
            let since = now.saturating_duration_since(last);
            if since < self.debounce {
                tracing::debug!(
                    "Stale connector '{}' seen {:?} after last forced disconnect; suppressed",
                    connector.id(),
                    since
                );
                return GuardAction::None;
            }
        }

        tracing::warn!(
            "Connector '{}' cannot query chain id while connected; forcing disconnect",
            connector.id()
        );
        self.last_forced_disconnect = Some(now);
        self.forced_disconnects += 1;
        GuardAction::ForceDisconnect
    }

    /// When the current reconnection attempt should be reported as stuck
    pub fn reconnect_deadline(&self) -> Option<Instant> {
        match self.reconnect_started {
            Some(started) if !self.reconnect_warned => Some(started + self.reconnect_warning_after),
            _ => None,
        }
    }

    /// Emit the stuck-reconnection warning if it is due. At most once per attempt.
    pub fn poll_reconnect(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.reconnect_deadline() else {
            return false;
        };
        if now < deadline {
            return false;
        }

        self.reconnect_warned = true;
        self.reconnect_warnings += 1;
        tracing::warn!(
            "Wallet has been reconnecting for more than {:?}; still waiting",
            self.reconnect_warning_after
        );
        true
    }

    pub fn forced_disconnects(&self) -> u64 {
        self.forced_disconnects
    }

    pub fn reconnect_warnings(&self) -> u64 {
        self.reconnect_warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeConnector {
        chain_id: bool,
    }

    impl Connector for FakeConnector {
        fn id(&self) -> &str {
            "fake"
        }

        fn supports_chain_id_query(&self) -> bool {
            self.chain_id
        }
    }

    const STALE: FakeConnector = FakeConnector { chain_id: false };
    const HEALTHY: FakeConnector = FakeConnector { chain_id: true };

    fn guard() -> CompatibilityGuard {
        CompatibilityGuard::new(&GuardConfig::default())
    }

    #[test]
    fn healthy_connector_is_left_alone() {
        let mut guard = guard();
        let now = Instant::now();

        assert_eq!(
            guard.observe(ConnectionStatus::Connected, Some(&HEALTHY), now),
            GuardAction::None
        );
        assert_eq!(guard.observe(ConnectionStatus::Connected, None, now), GuardAction::None);
    }

    #[test]
    fn stale_connector_only_matters_while_connected() {
        let mut guard = guard();
        let now = Instant::now();

        assert_eq!(
            guard.observe(ConnectionStatus::Connecting, Some(&STALE), now),
            GuardAction::None
        );
        assert_eq!(
            guard.observe(ConnectionStatus::Connected, Some(&STALE), now),
            GuardAction::ForceDisconnect
        );
    }

    #[test]
    fn forced_disconnects_are_debounced() {
        let mut guard = guard();
        let start = Instant::now();

        assert_eq!(
            guard.observe(ConnectionStatus::Connected, Some(&STALE), start),
            GuardAction::ForceDisconnect
        );
        assert_eq!(
            guard.observe(ConnectionStatus::Connected, Some(&STALE), start + Duration::from_secs(9)),
            GuardAction::None
        );
        assert_eq!(
            guard.observe(ConnectionStatus::Connected, Some(&STALE), start + Duration::from_secs(10)),
            GuardAction::ForceDisconnect
        );
        assert_eq!(guard.forced_disconnects(), 2);
    }

    #[test]
    fn stuck_reconnection_warns_once_per_attempt() {
        let mut guard = guard();
        let start = Instant::now();

        guard.observe(ConnectionStatus::Reconnecting, None, start);
        assert_eq!(guard.phase(), GuardPhase::Reconnecting);
        assert!(!guard.poll_reconnect(start + Duration::from_secs(14)));
        assert!(guard.poll_reconnect(start + Duration::from_secs(15)));
        assert!(!guard.poll_reconnect(start + Duration::from_secs(60)));
        assert_eq!(guard.reconnect_deadline(), None);

        // Repeated reconnecting notifications do not restart the attempt
        guard.observe(ConnectionStatus::Reconnecting, None, start + Duration::from_secs(61));
        assert!(!guard.poll_reconnect(start + Duration::from_secs(90)));
        assert_eq!(guard.reconnect_warnings(), 1);
    }

    #[test]
    fn next_reconnection_is_timed_independently() {
        let mut guard = guard();
        let start = Instant::now();

        guard.observe(ConnectionStatus::Reconnecting, None, start);
        assert!(guard.poll_reconnect(start + Duration::from_secs(20)));

        guard.observe(ConnectionStatus::Connected, Some(&HEALTHY), start + Duration::from_secs(21));
        assert_eq!(guard.phase(), GuardPhase::Stable);
        assert_eq!(guard.reconnect_deadline(), None);

        let second = start + Duration::from_secs(30);
        guard.observe(ConnectionStatus::Reconnecting, None, second);
        assert_eq!(guard.reconnect_deadline(), Some(second + Duration::from_secs(15)));
        assert!(guard.poll_reconnect(second + Duration::from_secs(15)));
        assert_eq!(guard.reconnect_warnings(), 2);
    }

    #[test]
    fn resolved_reconnection_never_warns() {
        let mut guard = guard();
        let start = Instant::now();

        guard.observe(ConnectionStatus::Reconnecting, None, start);
        guard.observe(ConnectionStatus::Disconnected, None, start + Duration::from_secs(5));
        assert!(!guard.poll_reconnect(start + Duration::from_secs(30)));
        assert_eq!(guard.reconnect_warnings(), 0);
    }
}
