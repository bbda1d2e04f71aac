//! Persisted timer snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::millis_between;

/// Everything the timer needs to rebuild itself after the process goes away
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub is_running: bool,
    pub workout_started_at: Option<DateTime<Utc>>,
    pub rest_showing: bool,
    pub rest_started_at: Option<DateTime<Utc>>,
    pub rest_duration_seconds: u32,
}

impl TimerSnapshot {
    /// Enforce `is_running <=> workout_started_at` and
    /// `rest_showing <=> rest_started_at`. A flag without its instant is
    /// dropped rather than trusted.
    pub fn normalized(mut self) -> Self {
        if self.workout_started_at.is_none() {
            self.is_running = false;
        }
        if !self.is_running {
            self.workout_started_at = None;
        }
        if self.rest_started_at.is_none() || self.rest_duration_seconds == 0 {
            self.rest_showing = false;
        }
        if !self.rest_showing {
            self.rest_started_at = None;
        }
        self
    }

    /// Remaining rest in milliseconds at `now`, if a rest was showing
    pub fn rest_remaining_ms(&self, now: DateTime<Utc>) -> Option<i64> {
        if !self.rest_showing {
            return None;
        }
        let started = self.rest_started_at?;
        let total = i64::from(self.rest_duration_seconds) * 1000;
        Some((total - millis_between(started, now)).clamp(0, total))
    }
}
