//! Shared handler state

use std::{sync::Arc, time::Instant};

use crate::{state::WorkoutTimerManager, tasks::LifecycleCoordinator};

/// Everything a handler can reach
#[derive(Debug)]
pub struct AppContext {
    pub manager: Arc<WorkoutTimerManager>,
    pub lifecycle: Arc<LifecycleCoordinator>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
}

impl AppContext {
    pub fn new(
        manager: Arc<WorkoutTimerManager>,
        lifecycle: Arc<LifecycleCoordinator>,
        host: String,
        port: u16,
    ) -> Self {
        Self {
            manager,
            lifecycle,
            start_time: Instant::now(),
            port,
            host,
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
