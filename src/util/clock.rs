//! Time sources for progress tracking and watchdog checks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Millisecond time source.
///
/// The queue only ever compares elapsed intervals, so any source that is
/// monotonic enough for elapsed-time arithmetic will do.
pub trait Clock: Send + Sync + 'static {
    /// Current time in milliseconds since an arbitrary epoch.
    fn now_ms(&self) -> u128;
}

/// Clock backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u128 {
        now_ms()
    }
}

/// Manually advanced clock for deterministic tests.
///
/// Clones share the same underlying counter, so a test harness can hand one
/// clone to the queue and keep another to drive time forward.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    ms: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `by`.
    pub fn advance(&self, by: Duration) {
        self.ms.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u128 {
        u128::from(self.ms.load(Ordering::SeqCst))
    }
}
