//! Daily schedule of manor mode transitions.
//!
//! The day is split into three ranges:
//!
//! - `refresh .. refresh + maintenance` - [`ManorMode::Maintenance`]
//! - `refresh + maintenance .. approve` - [`ManorMode::Modifiable`]
//! - `approve .. refresh` (wrapping midnight) - [`ManorMode::Approved`]
//!
//! With the defaults that is 06:00, 06:03 and 20:00.

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{ManorError, Result};
use crate::mode::ManorMode;

const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Source of wall-clock time for the mode loop.
pub trait Clock: Send + Sync {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;
}

/// Reads the system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Times of day at which the manor changes mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManorSchedule {
    /// Hour at which periods rotate (maintenance starts).
    pub refresh_hour: u32,
    /// Minute at which periods rotate.
    pub refresh_minute: u32,
    /// Length of maintenance in minutes.
    pub maintenance_minutes: u32,
    /// Hour at which next period settings are approved.
    pub approve_hour: u32,
    /// Minute at which next period settings are approved.
    pub approve_minute: u32,
}

impl Default for ManorSchedule {
    fn default() -> Self {
        Self {
            refresh_hour: 6,
            refresh_minute: 0,
            maintenance_minutes: 3,
            approve_hour: 20,
            approve_minute: 0,
        }
    }
}

impl ManorSchedule {
    /// Check that refresh, maintenance end and approval fall in order within one day.
    pub fn validate(&self) -> Result<()> {
        if self.refresh_hour > 23 || self.approve_hour > 23 {
            return Err(ManorError::InvalidSchedule(format!(
                "hours must be below 24 (refresh {}, approve {})",
                self.refresh_hour, self.approve_hour
            )));
        }
        if self.refresh_minute > 59 || self.approve_minute > 59 {
            return Err(ManorError::InvalidSchedule(format!(
                "minutes must be below 60 (refresh {}, approve {})",
                self.refresh_minute, self.approve_minute
            )));
        }
        if self.maintenance_minutes == 0 {
            return Err(ManorError::InvalidSchedule(
                "maintenance must last at least one minute".to_string(),
            ));
        }
        if self.maintenance_end_secs() >= self.approve_secs() {
            return Err(ManorError::InvalidSchedule(format!(
                "maintenance must end before approval ({:02}:{:02} + {}m >= {:02}:{:02})",
                self.refresh_hour,
                self.refresh_minute,
                self.maintenance_minutes,
                self.approve_hour,
                self.approve_minute
            )));
        }
        Ok(())
    }

    /// Mode the manor should be in at the given time of day.
    #[must_use]
    pub fn determine_mode(&self, now: NaiveTime) -> ManorMode {
        let secs = now.num_seconds_from_midnight();
        if secs >= self.refresh_secs() && secs < self.maintenance_end_secs() {
            ManorMode::Maintenance
        } else if secs >= self.maintenance_end_secs() && secs < self.approve_secs() {
            ManorMode::Modifiable
        } else {
            ManorMode::Approved
        }
    }

    /// Next instant strictly after `now` at which `mode` ends.
    ///
    /// Returns `None` for [`ManorMode::Disabled`], which never ends on its own.
    #[must_use]
    pub fn next_transition(&self, mode: ManorMode, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let end_secs = match mode {
            ManorMode::Disabled => return None,
            ManorMode::Approved => self.refresh_secs(),
            ManorMode::Maintenance => self.maintenance_end_secs(),
            ManorMode::Modifiable => self.approve_secs(),
        };
        let at = NaiveTime::from_num_seconds_from_midnight_opt(end_secs % SECONDS_PER_DAY, 0)?;
        let mut candidate = now.date().and_time(at);
        if candidate <= now {
            candidate += Duration::days(1);
        }
        Some(candidate)
    }

    fn refresh_secs(&self) -> u32 {
        self.refresh_hour * 3600 + self.refresh_minute * 60
    }

    fn maintenance_end_secs(&self) -> u32 {
        self.refresh_secs() + self.maintenance_minutes * 60
    }

    fn approve_secs(&self) -> u32 {
        self.approve_hour * 3600 + self.approve_minute * 60
    }
}
