//! Clock sources for rotation and retention decisions.
//!
//! All timestamps are UTC. Period boundaries are computed in UTC as well, so a
//! change of the host timezone never shifts a rotation.

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Supplies the current time.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock that never moves backwards.
///
/// Wraps `Utc::now()` but guarantees each `now()` call returns a timestamp
/// that is not earlier than any previous call, even if the system clock jumps
/// backwards. When the clock goes backwards the last seen timestamp is
/// returned until the wall clock catches up.
#[derive(Debug)]
pub struct SystemClock {
    max_seen_micros: AtomicI64,
}

impl SystemClock {
    /// Create a new clock initialized with the current system time.
    pub fn new() -> Self {
        Self::with_initial(Utc::now())
    }

    /// Create a clock that will not report anything earlier than `initial`.
    pub fn with_initial(initial: DateTime<Utc>) -> Self {
        Self {
            max_seen_micros: AtomicI64::new(initial.timestamp_micros()),
        }
    }

    /// Get the last returned timestamp without advancing the clock.
    pub fn last_seen(&self) -> DateTime<Utc> {
        from_micros(self.max_seen_micros.load(Ordering::Acquire))
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let current = Utc::now().timestamp_micros();
        let previous = self.max_seen_micros.fetch_max(current, Ordering::AcqRel);
        from_micros(previous.max(current))
    }
}

fn from_micros(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Simulated clock for tests and dry runs.
///
/// Clones share the same instant, so a test can hand one clone to a
/// `RotationManager` and advance time through another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(initial: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(initial)),
        }
    }

    /// Moves the clock to `instant`, which may be in the past.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock() = instant;
    }

    /// Moves the clock forward by `step`.
    pub fn advance(&self, step: Duration) {
        let step = TimeDelta::from_std(step).unwrap_or(TimeDelta::MAX);
        let mut now = self.now.lock();
        *now = now.checked_add_signed(step).unwrap_or(DateTime::<Utc>::MAX_UTC);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
