//! App lifecycle coordination
//!
//! Persists on the way out, rebuilds from persisted instants on the way
//! back. Terminated is never observed directly: a cold start that finds a
//! saved snapshot is how it shows up.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    clock::millis_between,
    state::{display_seconds, TimerSnapshot, WorkoutTimerManager},
    store::TimerStateStore,
};

/// Observed process state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppPhase {
    Active,
    Background,
}

/// Workout clock to resume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutRestore {
    pub started_at: DateTime<Utc>,
    pub elapsed_seconds: u64,
}

/// What to do with a saved rest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestRestore {
    None,
    /// Start a fresh session with this many seconds
    Restart { remaining_seconds: u32 },
    /// Ran out while away; clear it quietly
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestorePlan {
    pub workout: Option<WorkoutRestore>,
    pub rest: RestRestore,
}

/// Decide how to rebuild timer state from `snapshot` at `now`
pub fn plan_restore(snapshot: &TimerSnapshot, now: DateTime<Utc>) -> RestorePlan {
    let snapshot = snapshot.clone().normalized();

    let workout = snapshot.workout_started_at.map(|started_at| WorkoutRestore {
        started_at,
        elapsed_seconds: u64::try_from(millis_between(started_at, now) / 1000).unwrap_or(0),
    });

    let rest = match snapshot.rest_remaining_ms(now) {
        None => RestRestore::None,
        Some(remaining_ms) if remaining_ms <= 0 => RestRestore::Expired,
        Some(remaining_ms) => RestRestore::Restart {
            remaining_seconds: display_seconds(remaining_ms),
        },
    };

    RestorePlan { workout, rest }
}

/// Reacts to foreground/background transitions
#[derive(Debug)]
pub struct LifecycleCoordinator {
    manager: Arc<WorkoutTimerManager>,
    store: TimerStateStore,
    phase: Mutex<AppPhase>,
}

impl LifecycleCoordinator {
    pub fn new(manager: Arc<WorkoutTimerManager>, store: TimerStateStore) -> Self {
        Self {
            manager,
            store,
            phase: Mutex::new(AppPhase::Active),
        }
    }

    pub fn phase(&self) -> AppPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: AppPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
        self.manager.set_foreground(phase == AppPhase::Active);
    }

    /// Process start. Any overlay still on screen belongs to a dead process
    /// and is ended before restoring.
    pub async fn cold_start(&self) {
        info!("Cold start, restoring timer state");
        self.manager.overlay().end_orphans();
        self.set_phase(AppPhase::Active);
        self.restore().await;
    }

    /// Active -> Background. Flushes synchronously first, then arms the
    /// rest notification for whatever time is left.
    pub fn enter_background(&self) {
        self.manager.persist();
        if let Some(remaining_ms) = self.manager.rest_remaining_ms().filter(|ms| *ms > 0) {
            let remaining = Duration::from_millis(u64::try_from(remaining_ms).unwrap_or(0));
            self.manager.notifications().arm(remaining);
        }
        self.set_phase(AppPhase::Background);
        info!("Entered background, timer state saved");
    }

    /// Background -> Active
    pub async fn enter_foreground(&self) {
        info!("Entering foreground");
        self.manager.notifications().clear_delivered();
        self.set_phase(AppPhase::Active);
        self.restore().await;
    }

    async fn restore(&self) {
        let snapshot = self.store.load();
        let plan = plan_restore(&snapshot, self.manager.clock().now());
        debug!("Restore plan: {:?}", plan);

        if let Some(workout) = plan.workout {
            self.manager.resume_workout(workout.started_at);
        }
        match plan.rest {
            RestRestore::None => {}
            RestRestore::Expired => {
                info!("Saved rest expired while away, clearing it");
                self.manager.clear_rest_state();
            }
            RestRestore::Restart { remaining_seconds } => {
                info!("Restarting rest with {}s remaining", remaining_seconds);
                self.manager.restore_rest(remaining_seconds).await;
            }
        }
    }
}
