//! Countdown feedback
//!
//! Stands in for the haptics/sound collaborator: it receives the threshold
//! and completion pulses and reports them.

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::state::{TimerEvent, WorkoutTimerManager};

/// Log every pulse the countdown emits
pub async fn feedback_task(manager: Arc<WorkoutTimerManager>) {
    let mut events = manager.subscribe();
    drop(manager);
    info!("Starting feedback task");

    loop {
        match events.recv().await {
            Ok(TimerEvent::RestPulse { seconds_left }) => {
                info!("Pulse: {} second(s) of rest left", seconds_left);
            }
            Ok(TimerEvent::RestCompleted) => info!("Pulse: rest complete"),
            Ok(other) => debug!("Timer event: {:?}", other),
            Err(RecvError::Lagged(missed)) => warn!("Feedback task missed {} events", missed),
            Err(RecvError::Closed) => break,
        }
    }
    info!("Feedback task finished");
}
