//! Network Monitor
//!
//! Tracks online/offline transitions and exposes the current connectivity
//! state. The monitor only reports state; it holds no retry or backoff logic.
//! Transition events are published on a broadcast channel so the sync engine
//! (and tests, with a fake source) can subscribe explicitly.

use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Network connectivity status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Online,
    Offline,
}

/// Connectivity monitor with an event stream of transitions.
///
/// Clones share the same underlying state and channel.
#[derive(Debug, Clone)]
pub struct NetworkMonitor {
    status: Arc<RwLock<NetworkStatus>>,
    events: broadcast::Sender<NetworkStatus>,
}

impl NetworkMonitor {
    /// Create a monitor with the given initial status
    pub fn new(initial: NetworkStatus) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            status: Arc::new(RwLock::new(initial)),
            events,
        }
    }

    /// Current connectivity status
    pub fn status(&self) -> NetworkStatus {
        *self.status.read().expect("network status lock poisoned")
    }

    pub fn is_online(&self) -> bool {
        self.status() == NetworkStatus::Online
    }

    /// Report a connectivity change. Publishes an event only on a real
    /// transition; repeated reports of the same status are ignored.
    pub fn set_status(&self, new_status: NetworkStatus) {
        {
            let mut status = self.status.write().expect("network status lock poisoned");
            if *status == new_status {
                return;
            }
            *status = new_status;
        }

        match new_status {
            NetworkStatus::Online => tracing::info!("network: online"),
            NetworkStatus::Offline => tracing::warn!("network: offline"),
        }

        // No subscribers is fine; the send result is irrelevant then.
        let _ = self.events.send(new_status);
    }

    /// Subscribe to transition events
    pub fn subscribe(&self) -> broadcast::Receiver<NetworkStatus> {
        self.events.subscribe()
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new(NetworkStatus::Offline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initial_status() {
        let monitor = NetworkMonitor::new(NetworkStatus::Online);
        assert!(monitor.is_online());

        let monitor = NetworkMonitor::default();
        assert!(!monitor.is_online());
    }

    #[tokio::test]
    async fn test_transition_publishes_event() {
        let monitor = NetworkMonitor::default();
        let mut events = monitor.subscribe();

        monitor.set_status(NetworkStatus::Online);
        assert_eq!(events.recv().await.unwrap(), NetworkStatus::Online);
        assert!(monitor.is_online());
    }

    #[tokio::test]
    async fn test_repeated_status_is_not_published() {
        let monitor = NetworkMonitor::default();
        let mut events = monitor.subscribe();

        monitor.set_status(NetworkStatus::Offline);
        monitor.set_status(NetworkStatus::Online);

        assert_eq!(events.recv().await.unwrap(), NetworkStatus::Online);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let monitor = NetworkMonitor::default();
        let clone = monitor.clone();
        let mut events = clone.subscribe();

        monitor.set_status(NetworkStatus::Online);
        assert!(clone.is_online());
        assert_eq!(events.recv().await.unwrap(), NetworkStatus::Online);
    }
}
