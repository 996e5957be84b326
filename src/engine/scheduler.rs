//! Sync Scheduler
//!
//! Decides when the periodic full sync is due. The background loop ticks
//! frequently and asks the scheduler, which keeps the interval logic in one
//! testable place instead of baking it into the timer.

use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Interval gate for periodic synchronization.
#[derive(Debug)]
pub struct SyncScheduler {
    last_sync: RwLock<Option<Instant>>,
    interval: Duration,
}

impl SyncScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_sync: RwLock::new(None),
            interval,
        }
    }

    /// Whether a periodic sync is due now. True before the first recorded
    /// sync.
    pub async fn should_sync(&self) -> bool {
        match *self.last_sync.read().await {
            Some(time) => time.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Record a completed sync attempt.
    pub async fn record_sync(&self) {
        *self.last_sync.write().await = Some(Instant::now());
    }

    /// Time until the next periodic sync is due.
    pub async fn time_until_next_sync(&self) -> Duration {
        match *self.last_sync.read().await {
            Some(time) => self.interval.saturating_sub(time.elapsed()),
            None => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_should_sync_initially() {
        let scheduler = SyncScheduler::new(Duration::from_secs(300));
        assert!(scheduler.should_sync().await);
        assert_eq!(scheduler.time_until_next_sync().await, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_should_not_sync_right_after_recording() {
        let scheduler = SyncScheduler::new(Duration::from_secs(300));
        scheduler.record_sync().await;
        assert!(!scheduler.should_sync().await);
        assert!(scheduler.time_until_next_sync().await > Duration::ZERO);
    }

    #[tokio::test]
    async fn test_zero_interval_is_always_due() {
        let scheduler = SyncScheduler::new(Duration::ZERO);
        scheduler.record_sync().await;
        assert!(scheduler.should_sync().await);
    }
}
