//! Wall-clock source for event timestamps
//!
//! `created_at_epoch_ms` on new events, delegate expiry and scrollback
//! date bounds all read "now" through [`Clock`].

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;

    /// Epoch ms `span` before now, saturating at zero.
    fn ms_before(&self, span: Duration) -> i64 {
        let span_ms = i64::try_from(span.as_millis()).unwrap_or(i64::MAX);
        self.now_ms().saturating_sub(span_ms).max(0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        // A clock set before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or_default()
    }
}

/// Clock that only moves when told to. Share it behind an `Arc` to step
/// time for a view or signer under test.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn at(now_ms: i64) -> Self {
        Self { now_ms: AtomicI64::new(now_ms) }
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let by_ms = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.now_ms.fetch_add(by_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_after_2025() {
        assert!(SystemClock.now_ms() > 1_735_689_600_000);
    }

    #[test]
    fn test_manual_clock_steps() {
        let clock = ManualClock::at(1_000);
        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now_ms(), 3_000);
        clock.set(50);
        assert_eq!(clock.now_ms(), 50);
    }

    #[test]
    fn test_ms_before_saturates() {
        let clock = ManualClock::at(10 * 3_600_000);
        assert_eq!(clock.ms_before(Duration::from_secs(3_600)), 9 * 3_600_000);
        assert_eq!(clock.ms_before(Duration::from_secs(11 * 3_600)), 0);
    }
}
