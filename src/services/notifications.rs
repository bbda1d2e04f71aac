//! Rest-complete notifications
//!
//! Exactly one "rest complete" notification is pending at a time. It carries
//! two actions, Skip and Add Time, which the backend reports back through a
//! channel once the user picks one.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};
use serde::{Deserialize, Serialize};
use tokio::{process::Command, runtime::Handle, sync::mpsc, task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

use crate::error::NotificationError;

/// Identifier of the pending rest-complete notification
pub const REST_COMPLETE_ID: &str = "rest-complete";
/// Identifier of the immediate in-app alert
pub const REST_ALERT_ID: &str = "rest-complete-alert";

/// Buttons on the rest-complete notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationAction {
    Skip,
    AddTime,
}

impl NotificationAction {
    pub fn key(&self) -> &'static str {
        match self {
            NotificationAction::Skip => "skip",
            NotificationAction::AddTime => "add-time",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "skip" => Some(NotificationAction::Skip),
            "add-time" => Some(NotificationAction::AddTime),
            _ => None,
        }
    }
}

/// A notification to show after a delay
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRequest {
    pub id: String,
    pub title: String,
    pub body: String,
    pub fire_after: Duration,
    /// Action key and button label
    pub actions: Vec<(NotificationAction, String)>,
}

/// Platform notification delivery
pub trait NotificationBackend: Send + Sync + fmt::Debug {
    fn schedule(&self, request: NotificationRequest) -> Result<(), NotificationError>;
    /// Drop a pending notification. Unknown ids are ignored.
    fn cancel(&self, id: &str);
    /// Dismiss notifications that were already shown
    fn clear_delivered(&self);
}

/// Backend used when notifications are turned off or unavailable
#[derive(Debug, Default)]
pub struct DisabledBackend;

impl NotificationBackend for DisabledBackend {
    fn schedule(&self, request: NotificationRequest) -> Result<(), NotificationError> {
        debug!("Notifications disabled, dropping '{}'", request.id);
        Ok(())
    }

    fn cancel(&self, _id: &str) {}

    fn clear_delivered(&self) {}
}

/// Arms and cancels the single rest-complete notification
#[derive(Debug, Clone)]
pub struct NotificationScheduler {
    backend: Arc<dyn NotificationBackend>,
    add_time_seconds: u32,
}

impl NotificationScheduler {
    pub fn new(backend: Arc<dyn NotificationBackend>, add_time_seconds: u32) -> Self {
        Self {
            backend,
            add_time_seconds,
        }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledBackend), 0)
    }

    /// Replace any pending rest notification with one firing `after` from now
    pub fn arm(&self, after: Duration) {
        self.backend.cancel(REST_COMPLETE_ID);
        let request = NotificationRequest {
            id: REST_COMPLETE_ID.to_string(),
            title: "Rest complete".to_string(),
            body: "Time for your next set.".to_string(),
            fire_after: after,
            actions: vec![
                (NotificationAction::Skip, "Skip".to_string()),
                (
                    NotificationAction::AddTime,
                    format!("Add {}s", self.add_time_seconds),
                ),
            ],
        };
        match self.backend.schedule(request) {
            Ok(()) => debug!("Rest notification armed for {:.1}s", after.as_secs_f64()),
            Err(e) => warn!("Failed to schedule rest notification: {}", e),
        }
    }

    pub fn cancel(&self) {
        self.backend.cancel(REST_COMPLETE_ID);
    }

    /// Fire the immediate alert shown when rest ends while the app is in front
    pub fn alert_now(&self) {
        let request = NotificationRequest {
            id: REST_ALERT_ID.to_string(),
            title: "Rest complete".to_string(),
            body: "Time for your next set.".to_string(),
            fire_after: Duration::ZERO,
            actions: Vec::new(),
        };
        if let Err(e) = self.backend.schedule(request) {
            warn!("Failed to deliver rest alert: {}", e);
        }
    }

    pub fn clear_delivered(&self) {
        self.backend.clear_delivered();
    }
}

#[derive(Debug)]
struct Scheduled {
    task: JoinHandle<()>,
    delivered: Arc<AtomicBool>,
}

/// Desktop notifications through `notify-send`.
///
/// Each notification is a task that sleeps until its fire time, then runs
/// `notify-send --wait` with one `--action` per button and reports the
/// chosen action key from stdout.
#[derive(Debug)]
pub struct NotifySendBackend {
    app_name: String,
    action_tx: mpsc::UnboundedSender<NotificationAction>,
    scheduled: Mutex<HashMap<String, Scheduled>>,
}

impl NotifySendBackend {
    pub fn new(app_name: impl Into<String>, action_tx: mpsc::UnboundedSender<NotificationAction>) -> Self {
        Self {
            app_name: app_name.into(),
            action_tx,
            scheduled: Mutex::new(HashMap::new()),
        }
    }

    fn command_for(&self, request: &NotificationRequest) -> Command {
        let mut command = Command::new("notify-send");
        command
            .arg(format!("--app-name={}", self.app_name))
            .arg("--urgency=critical");
        if !request.actions.is_empty() {
            command.arg("--wait");
            for (action, label) in &request.actions {
                command.arg(format!("--action={}={}", action.key(), label));
            }
        }
        command.arg(&request.title).arg(&request.body).kill_on_drop(true);
        command
    }
}

impl NotificationBackend for NotifySendBackend {
    fn schedule(&self, request: NotificationRequest) -> Result<(), NotificationError> {
        let runtime = Handle::try_current()
            .map_err(|e| NotificationError::Unavailable(format!("no async runtime: {}", e)))?;

        let mut command = self.command_for(&request);
        let delivered = Arc::new(AtomicBool::new(false));
        let task_delivered = Arc::clone(&delivered);
        let action_tx = self.action_tx.clone();
        let id = request.id.clone();
        let fire_after = request.fire_after;

        let task = runtime.spawn(async move {
            if !fire_after.is_zero() {
                sleep(fire_after).await;
            }
            task_delivered.store(true, Ordering::SeqCst);
            info!("Delivering notification '{}'", id);

            let output = match command.output().await {
                Ok(output) => output,
                Err(e) => {
                    warn!("Failed to run notify-send: {}", e);
                    return;
                }
            };
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!("notify-send failed: {}", stderr.trim());
                return;
            }
            let stdout = String::from_utf8_lossy(&output.stdout);
            if let Some(action) = NotificationAction::from_key(&stdout) {
                debug!("Notification '{}' answered with {:?}", id, action);
                if action_tx.send(action).is_err() {
                    warn!("Notification action dropped, no listener");
                }
            }
        });

        let mut scheduled = self.scheduled.lock().unwrap_or_else(PoisonError::into_inner);
        scheduled.retain(|_, entry| !entry.task.is_finished());
        if let Some(previous) = scheduled.insert(request.id, Scheduled { task, delivered }) {
            previous.task.abort();
        }
        Ok(())
    }

    fn cancel(&self, id: &str) {
        let mut scheduled = self.scheduled.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = scheduled.remove(id) {
            entry.task.abort();
            debug!("Cancelled notification '{}'", id);
        }
    }

    fn clear_delivered(&self) {
        let mut scheduled = self.scheduled.lock().unwrap_or_else(PoisonError::into_inner);
        scheduled.retain(|id, entry| {
            let delivered = entry.delivered.load(Ordering::SeqCst);
            if delivered {
                entry.task.abort();
                debug!("Cleared delivered notification '{}'", id);
            }
            !delivered
        });
    }
}

/// Check that `notify-send` can be executed
pub async fn check_notify_send_available() -> Result<(), NotificationError> {
    let output = Command::new("notify-send")
        .arg("--version")
        .output()
        .await
        .map_err(|_| NotificationError::Unavailable("notify-send is not installed".to_string()))?;
    if !output.status.success() {
        return Err(NotificationError::Unavailable(
            "notify-send --version failed".to_string(),
        ));
    }
    info!("notify-send is available");
    Ok(())
}
