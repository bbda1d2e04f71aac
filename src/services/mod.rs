//! Platform-facing services
//!
//! Notifications and the live overlay. Both are best effort: a failure here
//! is logged and the in-app timer carries on.

pub mod notifications;
pub mod overlay;

pub use notifications::{
    check_notify_send_available, DisabledBackend, NotificationAction, NotificationBackend,
    NotificationRequest, NotificationScheduler, NotifySendBackend, REST_ALERT_ID, REST_COMPLETE_ID,
};
pub use overlay::{OverlayContent, OverlayHandle, OverlayPublisher, OverlaySurface, StatusFileSurface};
