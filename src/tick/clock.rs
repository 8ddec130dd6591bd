//! Time sources for tick timestamps.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::now_ms;

/// Wall-clock time in milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// System time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        now_ms()
    }
}

/// Clock that only moves when told to. Used by tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Stamps ticks so that timestamps never decrease, even if the wall clock
/// steps backwards.
#[derive(Debug, Default)]
pub struct MonotonicStamp {
    last: u64,
}

impl MonotonicStamp {
    pub fn stamp(&mut self, now: u64) -> u64 {
        self.last = self.last.max(now);
        self.last
    }

    pub fn last(&self) -> u64 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_never_goes_backwards() {
        let mut stamp = MonotonicStamp::default();
        assert_eq!(stamp.stamp(1000), 1000);
        assert_eq!(stamp.stamp(900), 1000);
        assert_eq!(stamp.stamp(1000), 1000);
        assert_eq!(stamp.stamp(1500), 1500);
        assert_eq!(stamp.last(), 1500);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(10);
        clock.advance(5);
        assert_eq!(clock.now_ms(), 15);
        clock.set(3);
        assert_eq!(clock.now_ms(), 3);
    }
}
