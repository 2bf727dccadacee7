//! Manor engine configuration.
//!
//! Deserialized from RON by the server; every field has a default.
//!
//! ```ron
//! ManorConfig(
//!     enabled: true,
//!     schedule: ManorSchedule(refresh_hour: 6, maintenance_minutes: 3, approve_hour: 20),
//!     save_interval_secs: 7200,
//!     save_all_actions: false,
//!     store_timeout_secs: 30,
//! )
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schedule::ManorSchedule;

/// Tunables for the manor manager and its background loops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManorConfig {
    /// When false the manor starts and stays in `Disabled` mode.
    pub enabled: bool,
    /// Daily transition times.
    pub schedule: ManorSchedule,
    /// Seconds between periodic saves.
    pub save_interval_secs: u64,
    /// Persist a castle as soon as its next period settings change.
    pub save_all_actions: bool,
    /// Seconds each persistence call may take before failing.
    pub store_timeout_secs: u64,
}

impl Default for ManorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedule: ManorSchedule::default(),
            save_interval_secs: 2 * 60 * 60,
            save_all_actions: false,
            store_timeout_secs: 30,
        }
    }
}

impl ManorConfig {
    /// Check the configuration for values the manager cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.schedule.validate()
    }

    /// Period of the save loop.
    #[must_use]
    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.save_interval_secs.max(1))
    }

    /// Deadline applied to each persistence call.
    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs.max(1))
    }
}
