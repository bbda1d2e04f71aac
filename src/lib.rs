//! Workout Timer - workout clock and rest countdown that survive suspension
//!
//! This library keeps an elapsed workout clock and a rest countdown correct
//! across suspend/resume/kill cycles, and keeps a pending notification and a
//! live status overlay in step with the countdown.

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod store;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::{create_router, AppContext};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use state::{TimerSettings, WorkoutTimerManager};
pub use tasks::LifecycleCoordinator;
pub use utils::signals::shutdown_signal;
