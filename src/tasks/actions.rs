//! Notification action listener

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use crate::{services::NotificationAction, state::WorkoutTimerManager};

/// Apply notification button presses until the sender side closes
pub async fn notification_action_task(
    manager: Arc<WorkoutTimerManager>,
    mut actions: mpsc::UnboundedReceiver<NotificationAction>,
) {
    info!("Starting notification action task");
    while let Some(action) = actions.recv().await {
        info!("Notification action: {:?}", action);
        manager.handle_notification_action(action).await;
    }
    info!("Notification action channel closed");
}
