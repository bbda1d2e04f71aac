//! Periodic timer tasks
//!
//! One live handle per logical session: the manager aborts the previous
//! ticker before spawning a new one, and never pauses one.

use std::{sync::Weak, time::Duration};
use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::debug;

use crate::state::WorkoutTimerManager;

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Spawn the workout clock ticker. Returns `None` outside a tokio runtime;
/// the caller can still drive [`WorkoutTimerManager::tick_elapsed`] itself.
pub fn spawn_elapsed_ticker(
    manager: Weak<WorkoutTimerManager>,
    period: Duration,
) -> Option<JoinHandle<()>> {
    spawn_ticker("elapsed", manager, period, WorkoutTimerManager::tick_elapsed)
}

/// Spawn the rest countdown ticker
pub fn spawn_rest_ticker(
    manager: Weak<WorkoutTimerManager>,
    period: Duration,
) -> Option<JoinHandle<()>> {
    spawn_ticker("rest", manager, period, WorkoutTimerManager::tick_rest)
}

fn spawn_ticker(
    name: &'static str,
    manager: Weak<WorkoutTimerManager>,
    period: Duration,
    tick: fn(&WorkoutTimerManager) -> bool,
) -> Option<JoinHandle<()>> {
    let runtime = match Handle::try_current() {
        Ok(runtime) => runtime,
        Err(_) => {
            debug!("No runtime, {} ticker not started", name);
            return None;
        }
    };

    Some(runtime.spawn(async move {
        let mut interval = interval(period.max(MIN_PERIOD));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // the first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            let Some(manager) = manager.upgrade() else {
                break;
            };
            if !tick(&manager) {
                break;
            }
        }
        debug!("{} ticker finished", name);
    }))
}
