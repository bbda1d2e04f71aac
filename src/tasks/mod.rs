//! Background tasks module
//!
//! Tickers, lifecycle handling and the listeners that run alongside the
//! HTTP server.

pub mod actions;
pub mod feedback;
pub mod lifecycle;
pub mod tickers;

pub use actions::notification_action_task;
pub use feedback::feedback_task;
pub use lifecycle::{plan_restore, AppPhase, LifecycleCoordinator, RestRestore, RestorePlan, WorkoutRestore};
