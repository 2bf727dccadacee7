//! Manually driven clock.

use std::sync::Mutex;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use manor_core::schedule::Clock;

/// Clock that only moves when a test moves it.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    /// Clock reading `now`.
    #[must_use]
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock reading the given time on a fixed test day.
    ///
    /// # Panics
    ///
    /// Panics if the time is not a valid time of day.
    #[must_use]
    pub fn at(hour: u32, minute: u32) -> Self {
        Self::new(test_day_at(hour, minute))
    }

    /// Jump to `now`.
    pub fn set(&self, now: NaiveDateTime) {
        *self.lock() = now;
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NaiveDateTime> {
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.lock()
    }
}

/// The given time on the fixed day test clocks start from.
///
/// # Panics
///
/// Panics if the time is not a valid time of day.
#[must_use]
pub fn test_day_at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 10)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .expect("valid test time")
}
