//! Rest countdown session
//!
//! A session only stores when it started and how long it lasts. Remaining
//! time and progress are derived from the clock on every poll, so a session
//! that sat through a suspension reports the right value the moment it is
//! polled again.

use std::collections::BTreeSet;
use chrono::{DateTime, Utc};

use crate::clock::millis_between;

/// Remaining-time boundaries (whole seconds) that emit a one-shot pulse
pub const PULSE_THRESHOLDS: [u8; 3] = [3, 2, 1];

/// Width of the lead-in window above each threshold
const THRESHOLD_WINDOW_MS: i64 = 100;

/// One rest period between sets
#[derive(Debug, Clone)]
pub struct RestSession {
    started_at: DateTime<Utc>,
    duration_seconds: u32,
    fired: BTreeSet<u8>,
}

impl RestSession {
    pub fn new(started_at: DateTime<Utc>, duration_seconds: u32) -> Self {
        Self {
            started_at,
            duration_seconds,
            fired: BTreeSet::new(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.started_at + chrono::Duration::seconds(i64::from(self.duration_seconds))
    }

    fn total_ms(&self) -> i64 {
        i64::from(self.duration_seconds) * 1000
    }

    /// Remaining time in milliseconds, clamped to `[0, duration]`
    pub fn remaining_ms(&self, now: DateTime<Utc>) -> i64 {
        let total = self.total_ms();
        (total - millis_between(self.started_at, now)).clamp(0, total)
    }

    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> f64 {
        self.remaining_ms(now) as f64 / 1000.0
    }

    /// Fraction of the rest still to go, in `[0, 1]`
    pub fn progress(&self, now: DateTime<Utc>) -> f64 {
        let total = self.total_ms();
        if total == 0 {
            return 0.0;
        }
        (self.remaining_ms(now) as f64 / total as f64).clamp(0.0, 1.0)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining_ms(now) <= 0
    }

    /// Check whether this poll crosses a pulse threshold for the first time.
    ///
    /// Threshold `t` owns the window `(lower, t + 0.1s]` where `lower` is the
    /// upper edge of the next threshold down (zero for the last one). Dense
    /// polling therefore fires inside `(t, t + 0.1s]`; sparse polling still
    /// fires each threshold at most once and never one that was skipped over.
    pub fn poll_threshold(&mut self, now: DateTime<Utc>) -> Option<u8> {
        let remaining = self.remaining_ms(now);
        for (index, &threshold) in PULSE_THRESHOLDS.iter().enumerate() {
            let upper = i64::from(threshold) * 1000 + THRESHOLD_WINDOW_MS;
            let lower = PULSE_THRESHOLDS
                .get(index + 1)
                .map(|next| i64::from(*next) * 1000 + THRESHOLD_WINDOW_MS)
                .unwrap_or(0);
            if remaining > lower && remaining <= upper {
                return self.fired.insert(threshold).then_some(threshold);
            }
        }
        None
    }

    pub fn has_fired(&self, threshold: u8) -> bool {
        self.fired.contains(&threshold)
    }
}

/// Whole seconds shown to the user: a countdown at 2.4s still reads "3"
pub fn display_seconds(remaining_ms: i64) -> u32 {
    let ms = remaining_ms.max(0);
    u32::try_from((ms + 999) / 1000).unwrap_or(u32::MAX)
}
