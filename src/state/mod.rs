//! Timer state module
//!
//! Data types for the workout clock and rest countdown, plus the manager
//! that mutates them.

pub mod exercise;
pub mod manager;
pub mod rest;
pub mod snapshot;
pub mod view;

pub use exercise::Exercise;
pub use manager::{TimerSettings, WorkoutTimerManager};
pub use rest::{display_seconds, RestSession, PULSE_THRESHOLDS};
pub use snapshot::TimerSnapshot;
pub use view::{RestEndReason, TimerEvent, TimerView};
