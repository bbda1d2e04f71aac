//! Workout timer manager
//!
//! Owns the workout clock and the rest countdown. Every mutation runs under
//! one lock, so "now" and the stored start instants are always read
//! together. Observers get a [`TimerView`] after each mutation through a
//! watch channel and discrete [`TimerEvent`]s through a broadcast channel.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, Weak,
    },
    time::Duration,
};
use chrono::{DateTime, Utc};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
    time::sleep,
};
use tracing::{debug, info, warn};

use super::{
    display_seconds, Exercise, RestEndReason, RestSession, TimerEvent, TimerSnapshot, TimerView,
};
use crate::{
    clock::{millis_between, Clock},
    services::{NotificationAction, NotificationScheduler, OverlayContent, OverlayPublisher},
    store::TimerStateStore,
    tasks::tickers::{spawn_elapsed_ticker, spawn_rest_ticker},
};

/// Engine tunables
#[derive(Debug, Clone)]
pub struct TimerSettings {
    /// Period of the workout clock ticker
    pub elapsed_tick: Duration,
    /// Period of the rest countdown ticker
    pub rest_tick: Duration,
    /// Gap between tearing down and restarting a rest after an adjustment
    pub restart_delay: Duration,
    /// Gap before restarting a restored rest
    pub settle_delay: Duration,
    /// Seconds added by the notification's Add Time action
    pub add_time_seconds: u32,
    /// Rest used when the current exercise has no custom value
    pub default_rest_seconds: u32,
    pub workout_label: String,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            elapsed_tick: Duration::from_secs(1),
            rest_tick: Duration::from_millis(100),
            restart_delay: Duration::from_millis(250),
            settle_delay: Duration::from_millis(300),
            add_time_seconds: 30,
            default_rest_seconds: 90,
            workout_label: "Workout".to_string(),
        }
    }
}

#[derive(Debug)]
struct TimerCore {
    workout_started_at: Option<DateTime<Utc>>,
    elapsed_seconds: u64,
    rest: Option<RestSession>,
    /// Bumped whenever a rest starts or ends; delayed restarts compare it
    rest_generation: u64,
    remaining_ms: i64,
    progress: f64,
    last_overlay_second: Option<u32>,
    workout_label: String,
    exercise: Exercise,
    elapsed_ticker: Option<JoinHandle<()>>,
    rest_ticker: Option<JoinHandle<()>>,
}

impl TimerCore {
    fn new(workout_label: String) -> Self {
        Self {
            workout_started_at: None,
            elapsed_seconds: 0,
            rest: None,
            rest_generation: 0,
            remaining_ms: 0,
            progress: 1.0,
            last_overlay_second: None,
            workout_label,
            exercise: Exercise::default(),
            elapsed_ticker: None,
            rest_ticker: None,
        }
    }

    fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            is_running: self.workout_started_at.is_some(),
            workout_started_at: self.workout_started_at,
            rest_showing: self.rest.is_some(),
            rest_started_at: self.rest.as_ref().map(RestSession::started_at),
            rest_duration_seconds: self
                .rest
                .as_ref()
                .map(RestSession::duration_seconds)
                .unwrap_or(0),
        }
    }

    fn view(&self) -> TimerView {
        TimerView {
            is_running: self.workout_started_at.is_some(),
            workout_started_at: self.workout_started_at,
            elapsed_seconds: self.elapsed_seconds,
            rest_showing: self.rest.is_some(),
            rest_remaining_seconds: self.remaining_ms as f64 / 1000.0,
            rest_progress: self.progress,
            rest_duration_seconds: self
                .rest
                .as_ref()
                .map(RestSession::duration_seconds)
                .unwrap_or(0),
            rest_ends_at: self.rest.as_ref().map(RestSession::ends_at),
            workout_label: self.workout_label.clone(),
            exercise_label: self.exercise.name.clone(),
        }
    }

    fn elapsed_at(&self, now: DateTime<Utc>) -> u64 {
        self.workout_started_at
            .map(|started| u64::try_from(millis_between(started, now) / 1000).unwrap_or(0))
            .unwrap_or(self.elapsed_seconds)
    }

    fn overlay_content(&self, now: DateTime<Utc>) -> OverlayContent {
        OverlayContent {
            workout_label: self.workout_label.clone(),
            current_exercise_label: self.exercise.name.clone(),
            rest_remaining_seconds: display_seconds(self.remaining_ms),
            total_elapsed_seconds: self.elapsed_at(now),
            is_resting: self.rest.is_some(),
            rest_ends_at: self.rest.as_ref().map(RestSession::ends_at),
        }
    }
}

/// The workout clock and rest countdown.
///
/// Built once by the application root and shared by `Arc`. Tickers hold
/// only a weak reference, so dropping the last `Arc` stops them.
#[derive(Debug)]
pub struct WorkoutTimerManager {
    clock: Arc<dyn Clock>,
    settings: TimerSettings,
    core: Mutex<TimerCore>,
    store: TimerStateStore,
    notifications: NotificationScheduler,
    overlay: OverlayPublisher,
    foreground: AtomicBool,
    event_tx: broadcast::Sender<TimerEvent>,
    view_tx: watch::Sender<TimerView>,
    /// Keep the receiver alive to prevent channel closure
    _view_rx: watch::Receiver<TimerView>,
    weak_self: Weak<Self>,
}

impl WorkoutTimerManager {
    pub fn new(
        clock: Arc<dyn Clock>,
        settings: TimerSettings,
        store: TimerStateStore,
        notifications: NotificationScheduler,
        overlay: OverlayPublisher,
    ) -> Arc<Self> {
        let core = TimerCore::new(settings.workout_label.clone());
        let (event_tx, _) = broadcast::channel(100);
        let (view_tx, view_rx) = watch::channel(core.view());

        Arc::new_cyclic(|weak_self| Self {
            clock,
            settings,
            core: Mutex::new(core),
            store,
            notifications,
            overlay,
            foreground: AtomicBool::new(true),
            event_tx,
            view_tx,
            _view_rx: view_rx,
            weak_self: weak_self.clone(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, TimerCore> {
        // every field is re-derivable from the stored instants
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Workout clock ────────────────────────────────────────────────

    /// Start the workout clock. A no-op when it is already running.
    pub fn start_workout(&self) {
        let mut core = self.lock();
        if core.workout_started_at.is_some() {
            debug!("Workout already running, keeping original start");
            return;
        }

        let now = self.clock.now();
        core.workout_started_at = Some(now);
        core.elapsed_seconds = 0;
        self.restart_elapsed_ticker(&mut core);
        info!("Workout started at {}", now);

        self.commit(&core);
        self.emit(TimerEvent::WorkoutStarted { started_at: now });
    }

    /// Continue a workout that started at `started_at`, e.g. after a restore.
    /// Elapsed time is recomputed from the instant, never counted.
    pub fn resume_workout(&self, started_at: DateTime<Utc>) {
        let mut core = self.lock();
        let now = self.clock.now();
        core.workout_started_at = Some(started_at);
        core.elapsed_seconds = core.elapsed_at(now);
        self.restart_elapsed_ticker(&mut core);
        info!("Workout resumed, {}s elapsed", core.elapsed_seconds);

        self.commit(&core);
        self.emit(TimerEvent::WorkoutResumed {
            started_at,
            elapsed_seconds: core.elapsed_seconds,
        });
    }

    /// Stop the workout clock, keeping the last elapsed value on display
    pub fn stop_workout(&self) {
        let mut core = self.lock();
        self.stop_workout_locked(&mut core);
    }

    /// Stop the workout clock and zero it
    pub fn reset_workout(&self) {
        let mut core = self.lock();
        self.stop_workout_locked(&mut core);
        core.elapsed_seconds = 0;
        self.publish_view(&core);
    }

    fn stop_workout_locked(&self, core: &mut TimerCore) {
        if let Some(ticker) = core.elapsed_ticker.take() {
            ticker.abort();
        }
        let Some(started_at) = core.workout_started_at else {
            return;
        };
        core.elapsed_seconds = core.elapsed_at(self.clock.now());
        core.workout_started_at = None;
        info!(
            "Workout stopped after {}s (started {})",
            core.elapsed_seconds, started_at
        );

        self.commit(core);
        self.emit(TimerEvent::WorkoutStopped {
            elapsed_seconds: core.elapsed_seconds,
        });
    }

    /// Recompute elapsed time. Returns false once the workout is no longer
    /// running so the ticker can exit.
    pub fn tick_elapsed(&self) -> bool {
        let mut core = self.lock();
        if core.workout_started_at.is_none() {
            return false;
        }
        let elapsed = core.elapsed_at(self.clock.now());
        if elapsed != core.elapsed_seconds {
            core.elapsed_seconds = elapsed;
            self.publish_view(&core);
        }
        true
    }

    fn restart_elapsed_ticker(&self, core: &mut TimerCore) {
        if let Some(ticker) = core.elapsed_ticker.take() {
            ticker.abort();
        }
        core.elapsed_ticker = spawn_elapsed_ticker(self.weak_self.clone(), self.settings.elapsed_tick);
    }

    // ── Rest countdown ───────────────────────────────────────────────

    /// Start a fresh rest countdown, replacing any current one. Zero seconds
    /// ends the rest instead.
    pub fn start_rest(&self, duration_seconds: u32) {
        let mut core = self.lock();
        self.start_rest_locked(&mut core, duration_seconds);
    }

    fn start_rest_locked(&self, core: &mut TimerCore, duration_seconds: u32) {
        if duration_seconds == 0 {
            warn!("Ignoring rest of 0s, ending rest instead");
            self.end_rest_locked(core, RestEndReason::Invalid);
            return;
        }
        if let Some(ticker) = core.rest_ticker.take() {
            ticker.abort();
        }

        let now = self.clock.now();
        let session = RestSession::new(now, duration_seconds);
        let ends_at = session.ends_at();
        core.rest = Some(session);
        core.rest_generation += 1;
        core.remaining_ms = i64::from(duration_seconds) * 1000;
        core.progress = 1.0;
        core.rest_ticker = spawn_rest_ticker(self.weak_self.clone(), self.settings.rest_tick);
        info!("Rest started for {}s, ends at {}", duration_seconds, ends_at);

        self.notifications
            .arm(Duration::from_secs(u64::from(duration_seconds)));
        self.publish_overlay(core, now);
        self.commit(core);
        self.emit(TimerEvent::RestStarted {
            duration_seconds,
            ends_at,
        });
    }

    /// End the current rest now (skip)
    pub fn end_rest(&self) {
        let mut core = self.lock();
        self.end_rest_locked(&mut core, RestEndReason::Skipped);
    }

    fn end_rest_locked(&self, core: &mut TimerCore, reason: RestEndReason) {
        if let Some(ticker) = core.rest_ticker.take() {
            ticker.abort();
        }
        let had_rest = core.rest.take().is_some();
        core.rest_generation += 1;
        core.remaining_ms = 0;
        core.progress = 1.0;
        core.last_overlay_second = None;

        // a countdown that ran out unseen leaves its pending notification
        // to alert the user
        let unseen_completion = reason == RestEndReason::Completed && !self.is_foreground();
        if !unseen_completion {
            self.notifications.cancel();
        }
        self.overlay.teardown();
        self.commit(core);

        if !had_rest {
            return;
        }
        info!("Rest ended: {:?}", reason);
        if reason == RestEndReason::Completed {
            self.emit(TimerEvent::RestCompleted);
            if self.is_foreground() {
                self.notifications.alert_now();
            }
        }
        self.emit(TimerEvent::RestEnded { reason });
    }

    /// Recompute remaining time, fire thresholds and finish the rest when
    /// it runs out. Returns false once no rest is active.
    pub fn tick_rest(&self) -> bool {
        let mut core = self.lock();
        let now = self.clock.now();
        let Some(session) = core.rest.as_mut() else {
            return false;
        };
        let pulse = session.poll_threshold(now);
        let remaining_ms = session.remaining_ms(now);
        let progress = session.progress(now);

        if let Some(seconds_left) = pulse {
            debug!("Rest pulse at {}s", seconds_left);
            self.emit(TimerEvent::RestPulse { seconds_left });
        }
        if remaining_ms <= 0 {
            self.end_rest_locked(&mut core, RestEndReason::Completed);
            return false;
        }

        core.remaining_ms = remaining_ms;
        core.progress = progress;
        if core.last_overlay_second != Some(display_seconds(remaining_ms)) {
            self.publish_overlay(&mut core, now);
        }
        self.publish_view(&core);
        true
    }

    /// Shift the current rest by `delta_seconds`.
    ///
    /// Anything that leaves no time ends the rest. Otherwise the session is
    /// torn down and a new one started with the new remaining time after
    /// `restart_delay`, so the overlay and notification are rebuilt rather
    /// than rewound.
    pub async fn adjust_rest(&self, delta_seconds: i64) {
        let (restart_seconds, generation) = {
            let mut core = self.lock();
            let Some(session) = core.rest.as_ref() else {
                debug!("No rest to adjust");
                return;
            };
            let remaining_ms = session
                .remaining_ms(self.clock.now())
                .saturating_add(delta_seconds.saturating_mul(1000));
            if remaining_ms <= 0 {
                info!("Rest adjusted by {}s to nothing", delta_seconds);
                self.end_rest_locked(&mut core, RestEndReason::Skipped);
                return;
            }

            info!("Rest adjusted by {}s, restarting", delta_seconds);
            self.end_rest_locked(&mut core, RestEndReason::Restarted);
            (display_seconds(remaining_ms), core.rest_generation)
        };
        self.restart_rest_after(self.settings.restart_delay, restart_seconds, generation)
            .await;
    }

    /// Replace whatever rest is in memory with a fresh session of
    /// `remaining_seconds`, after `settle_delay`
    pub async fn restore_rest(&self, remaining_seconds: u32) {
        let generation = {
            let mut core = self.lock();
            if core.rest.is_some() {
                self.end_rest_locked(&mut core, RestEndReason::Restarted);
            }
            core.rest_generation
        };
        self.restart_rest_after(self.settings.settle_delay, remaining_seconds, generation)
            .await;
    }

    async fn restart_rest_after(&self, delay: Duration, seconds: u32, generation: u64) {
        if !delay.is_zero() {
            sleep(delay).await;
        }
        let mut core = self.lock();
        if core.rest_generation != generation {
            debug!("Rest changed during restart delay, dropping restart");
            return;
        }
        self.start_rest_locked(&mut core, seconds);
    }

    /// Drop rest state that expired while nobody was watching. No pulses,
    /// no completion.
    pub fn clear_rest_state(&self) {
        let mut core = self.lock();
        if let Some(ticker) = core.rest_ticker.take() {
            ticker.abort();
        }
        core.rest = None;
        core.rest_generation += 1;
        core.remaining_ms = 0;
        core.progress = 1.0;
        core.last_overlay_second = None;
        self.notifications.cancel();
        self.overlay.teardown();
        debug!("Cleared expired rest state");
        self.commit(&core);
    }

    /// Apply a notification button press
    pub async fn handle_notification_action(&self, action: NotificationAction) {
        match action {
            NotificationAction::Skip => self.end_rest(),
            NotificationAction::AddTime => {
                self.adjust_rest(i64::from(self.settings.add_time_seconds))
                    .await
            }
        }
    }

    // ── Labels ───────────────────────────────────────────────────────

    /// Switch the current exercise; refreshes a live overlay
    pub fn set_exercise(&self, exercise: Exercise) {
        let mut core = self.lock();
        debug!("Current exercise: {}", exercise.name);
        core.exercise = exercise;
        self.overlay.refresh(core.overlay_content(self.clock.now()));
        self.publish_view(&core);
    }

    pub fn set_workout_label(&self, label: impl Into<String>) {
        let mut core = self.lock();
        core.workout_label = label.into();
        self.overlay.refresh(core.overlay_content(self.clock.now()));
        self.publish_view(&core);
    }

    pub fn current_exercise(&self) -> Exercise {
        self.lock().exercise.clone()
    }

    /// Rest to use for the next set of the current exercise
    pub fn next_rest_seconds(&self) -> u32 {
        self.lock()
            .exercise
            .effective_rest_seconds(self.settings.default_rest_seconds)
    }

    // ── Queries and plumbing ─────────────────────────────────────────

    pub fn view(&self) -> TimerView {
        self.lock().view()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.lock().snapshot()
    }

    /// Remaining rest right now, if resting
    pub fn rest_remaining_ms(&self) -> Option<i64> {
        let core = self.lock();
        core.rest
            .as_ref()
            .map(|session| session.remaining_ms(self.clock.now()))
    }

    /// Write the current snapshot synchronously. Holds the lock across the
    /// save so a concurrent commit cannot be overwritten by an older snapshot.
    pub fn persist(&self) {
        let core = self.lock();
        if let Err(e) = self.store.save(&core.snapshot()) {
            warn!("Failed to persist timer state: {}", e);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.event_tx.subscribe()
    }

    pub fn watch(&self) -> watch::Receiver<TimerView> {
        self.view_tx.subscribe()
    }

    pub fn set_foreground(&self, foreground: bool) {
        self.foreground.store(foreground, Ordering::SeqCst);
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground.load(Ordering::SeqCst)
    }

    pub fn notifications(&self) -> &NotificationScheduler {
        &self.notifications
    }

    pub fn overlay(&self) -> &OverlayPublisher {
        &self.overlay
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    /// Stop both tickers without touching persisted state
    pub fn shutdown(&self) {
        let mut core = self.lock();
        if let Some(ticker) = core.elapsed_ticker.take() {
            ticker.abort();
        }
        if let Some(ticker) = core.rest_ticker.take() {
            ticker.abort();
        }
        debug!("Timer tickers stopped");
    }

    fn publish_overlay(&self, core: &mut TimerCore, now: DateTime<Utc>) {
        let content = core.overlay_content(now);
        core.last_overlay_second = Some(content.rest_remaining_seconds);
        self.overlay.publish(content);
    }

    fn publish_view(&self, core: &TimerCore) {
        self.view_tx.send_replace(core.view());
    }

    /// Persist and publish after a state change
    fn commit(&self, core: &TimerCore) {
        if let Err(e) = self.store.save(&core.snapshot()) {
            warn!("Failed to persist timer state: {}", e);
        }
        self.publish_view(core);
    }

    fn emit(&self, event: TimerEvent) {
        // no subscribers is fine
        let _ = self.event_tx.send(event);
    }
}
