//! Observer-facing timer state and events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full timer state, broadcast to observers after every mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerView {
    pub is_running: bool,
    pub workout_started_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: u64,
    pub rest_showing: bool,
    pub rest_remaining_seconds: f64,
    pub rest_progress: f64,
    pub rest_duration_seconds: u32,
    pub rest_ends_at: Option<DateTime<Utc>>,
    pub workout_label: String,
    pub exercise_label: String,
}

impl Default for TimerView {
    fn default() -> Self {
        Self {
            is_running: false,
            workout_started_at: None,
            elapsed_seconds: 0,
            rest_showing: false,
            rest_remaining_seconds: 0.0,
            rest_progress: 1.0,
            rest_duration_seconds: 0,
            rest_ends_at: None,
            workout_label: String::new(),
            exercise_label: String::new(),
        }
    }
}

/// Why a rest period stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestEndReason {
    /// Countdown reached zero
    Completed,
    /// Ended by the user, or adjusted to nothing
    Skipped,
    /// Torn down so a fresh session can replace it
    Restarted,
    /// Asked to rest for zero seconds
    Invalid,
}

/// Discrete timer events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEvent {
    WorkoutStarted { started_at: DateTime<Utc> },
    WorkoutResumed { started_at: DateTime<Utc>, elapsed_seconds: u64 },
    WorkoutStopped { elapsed_seconds: u64 },
    RestStarted { duration_seconds: u32, ends_at: DateTime<Utc> },
    /// Countdown crossed the 3, 2 or 1 second mark
    RestPulse { seconds_left: u8 },
    RestCompleted,
    RestEnded { reason: RestEndReason },
}
