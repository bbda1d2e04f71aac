#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::broadcast;
use workout_timer::{
    error::{NotificationError, OverlayError},
    services::{
        NotificationBackend, NotificationRequest, NotificationScheduler, OverlayContent,
        OverlayHandle, OverlayPublisher, OverlaySurface,
    },
    state::{TimerEvent, TimerSettings, WorkoutTimerManager},
    store::{KeyValueStore, MemoryStore, TimerStateStore},
    tasks::LifecycleCoordinator,
    Clock, ManualClock,
};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 4, 17, 45, 0).unwrap()
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub scheduled: Mutex<Vec<NotificationRequest>>,
    pub cancelled: Mutex<Vec<String>>,
    pub cleared: AtomicUsize,
}

impl RecordingBackend {
    pub fn scheduled_ids(&self) -> Vec<String> {
        self.scheduled.lock().unwrap().iter().map(|r| r.id.clone()).collect()
    }

    pub fn last_scheduled(&self) -> Option<NotificationRequest> {
        self.scheduled.lock().unwrap().last().cloned()
    }
}

impl NotificationBackend for RecordingBackend {
    fn schedule(&self, request: NotificationRequest) -> Result<(), NotificationError> {
        self.scheduled.lock().unwrap().push(request);
        Ok(())
    }

    fn cancel(&self, id: &str) {
        self.cancelled.lock().unwrap().push(id.to_string());
    }

    fn clear_delivered(&self) {
        self.cleared.fetch_add(1, Ordering::SeqCst);
    }
}

/// Overlay surface that logs every call as "op:id"
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub log: Mutex<Vec<String>>,
    pub contents: Mutex<Vec<OverlayContent>>,
    next_id: AtomicUsize,
    /// Overlays left behind by a previous process
    pub orphans: AtomicUsize,
}

impl RecordingSurface {
    pub fn ops(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.ops().iter().filter(|entry| entry.starts_with(op)).count()
    }

    pub fn last_content(&self) -> Option<OverlayContent> {
        self.contents.lock().unwrap().last().cloned()
    }
}

impl OverlaySurface for RecordingSurface {
    fn create(&self, content: &OverlayContent) -> Result<OverlayHandle, OverlayError> {
        let id = format!("o{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.log.lock().unwrap().push(format!("create:{id}"));
        self.contents.lock().unwrap().push(content.clone());
        Ok(OverlayHandle::new(id))
    }

    fn update(&self, handle: &OverlayHandle, content: &OverlayContent) -> Result<(), OverlayError> {
        self.log.lock().unwrap().push(format!("update:{}", handle.id()));
        self.contents.lock().unwrap().push(content.clone());
        Ok(())
    }

    fn end(&self, handle: &OverlayHandle) {
        self.log.lock().unwrap().push(format!("end:{}", handle.id()));
    }

    fn end_all(&self) -> usize {
        self.log.lock().unwrap().push("end_all".to_string());
        self.orphans.swap(0, Ordering::SeqCst)
    }
}

pub struct Harness {
    pub manager: Arc<WorkoutTimerManager>,
    pub clock: Arc<ManualClock>,
    pub notifications: Arc<RecordingBackend>,
    pub surface: Arc<RecordingSurface>,
    pub store: TimerStateStore,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), t0())
    }

    pub fn with_store(kv: Arc<dyn KeyValueStore>, now: DateTime<Utc>) -> Self {
        Self::build(kv, now, RecordingSurface::default())
    }

    pub fn build(kv: Arc<dyn KeyValueStore>, now: DateTime<Utc>, surface: RecordingSurface) -> Self {
        let clock = Arc::new(ManualClock::new(now));
        let notifications = Arc::new(RecordingBackend::default());
        let surface = Arc::new(surface);
        let store = TimerStateStore::new(kv);
        let settings = TimerSettings {
            workout_label: "Push Day".to_string(),
            ..TimerSettings::default()
        };
        let manager = WorkoutTimerManager::new(
            clock.clone(),
            settings,
            store.clone(),
            NotificationScheduler::new(notifications.clone(), 30),
            OverlayPublisher::new(surface.clone()),
        );
        Self {
            manager,
            clock,
            notifications,
            surface,
            store,
        }
    }

    pub fn lifecycle(&self) -> LifecycleCoordinator {
        LifecycleCoordinator::new(self.manager.clone(), self.store.clone())
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn advance_ms(&self, ms: u64) {
        self.clock.advance(Duration::from_millis(ms));
    }

    /// Advance in 100ms steps, ticking the rest countdown after each
    pub fn tick_rest_for_ms(&self, ms: u64) {
        for _ in 0..ms / 100 {
            self.advance_ms(100);
            self.manager.tick_rest();
        }
    }
}

pub fn drain(events: &mut broadcast::Receiver<TimerEvent>) -> Vec<TimerEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

pub fn pulses(events: &[TimerEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|event| match event {
            TimerEvent::RestPulse { seconds_left } => Some(*seconds_left),
            _ => None,
        })
        .collect()
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}
