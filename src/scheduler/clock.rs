//! Time source for the collection loop.
//!
//! Wall-clock reads and sleeps go through [`Clock`] so cycle timing can be
//! tested without real delays.

use std::sync::Mutex;
use std::time::Duration;

/// Source of "now" and "sleep" for the scheduler.
pub trait Clock {
    /// Current time in milliseconds since the Unix epoch.
    fn now_unix_millis(&self) -> i64;

    /// Blocks the caller for `duration`.
    fn sleep(&self, duration: Duration);
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_unix_millis(&self) -> i64 {
        (**self).now_unix_millis()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Virtual clock: `sleep` returns immediately and advances "now".
#[derive(Debug)]
pub struct MockClock {
    now_ms: Mutex<i64>,
    slept: Mutex<Vec<Duration>>,
}

impl MockClock {
    /// Creates a clock starting at `now_ms`.
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: Mutex::new(now_ms),
            slept: Mutex::new(Vec::new()),
        }
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.slept.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Sum of all requested sleeps.
    pub fn total_slept(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

impl Clock for MockClock {
    fn now_unix_millis(&self) -> i64 {
        self.now_ms.lock().map(|now| *now).unwrap_or_default()
    }

    fn sleep(&self, duration: Duration) {
        if let Ok(mut now) = self.now_ms.lock() {
            *now += duration.as_millis() as i64;
        }
        if let Ok(mut slept) = self.slept.lock() {
            slept.push(duration);
        }
    }
}
