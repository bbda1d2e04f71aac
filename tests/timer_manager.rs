mod common;

use std::{
    sync::{mpsc, Arc, Mutex},
    thread,
    time::Duration,
};

use common::{assert_close, drain, pulses, t0, Harness};
use workout_timer::{
    error::StoreError,
    services::{NotificationAction, REST_ALERT_ID, REST_COMPLETE_ID},
    state::{Exercise, RestEndReason, TimerEvent},
    store::{KeyValueStore, MemoryStore},
};

#[tokio::test(start_paused = true)]
async fn start_then_end_rest_leaves_clean_state() {
    let h = Harness::new();
    for duration in [1, 45, 90, 600] {
        h.manager.start_rest(duration);
        assert!(h.manager.view().rest_showing);
        h.manager.end_rest();

        let view = h.manager.view();
        assert!(!view.rest_showing);
        assert_eq!(view.rest_remaining_seconds, 0.0);
        assert_eq!(view.rest_progress, 1.0);
        assert!(!h.store.load().rest_showing);
    }
    assert!(!h.manager.overlay().is_active());
    assert_eq!(h.surface.count("create"), 4);
    assert_eq!(h.surface.count("end"), 4);
}

#[tokio::test(start_paused = true)]
async fn remaining_and_progress_follow_the_clock() {
    let h = Harness::new();
    h.manager.start_rest(60);

    h.advance_ms(15_000);
    h.manager.tick_rest();
    let view = h.manager.view();
    assert_close(view.rest_remaining_seconds, 45.0, 0.1);
    assert_close(view.rest_progress, 0.75, 0.002);

    h.advance_ms(44_000);
    h.manager.tick_rest();
    assert_close(h.manager.view().rest_remaining_seconds, 1.0, 0.1);
}

#[tokio::test(start_paused = true)]
async fn workout_and_rest_scenario() {
    let h = Harness::new();
    let mut events = h.manager.subscribe();

    h.manager.start_workout();
    h.advance_ms(5_000);
    h.manager.tick_elapsed();
    assert_eq!(h.manager.view().elapsed_seconds, 5);

    h.manager.start_rest(90);
    h.tick_rest_for_ms(87_000);

    let seen = drain(&mut events);
    assert_eq!(pulses(&seen), vec![3]);
    let view = h.manager.view();
    assert!(view.rest_showing);
    assert_close(view.rest_remaining_seconds, 3.0, 0.1);

    h.manager.tick_elapsed();
    assert_eq!(h.manager.view().elapsed_seconds, 92);
}

#[tokio::test(start_paused = true)]
async fn countdown_completes_once_with_all_pulses() {
    let h = Harness::new();
    let mut events = h.manager.subscribe();

    h.manager.start_rest(10);
    // keep ticking well past the end
    h.tick_rest_for_ms(15_000);

    let seen = drain(&mut events);
    assert_eq!(pulses(&seen), vec![3, 2, 1]);
    let completions = seen
        .iter()
        .filter(|event| **event == TimerEvent::RestCompleted)
        .count();
    assert_eq!(completions, 1);
    assert_eq!(
        seen.last(),
        Some(&TimerEvent::RestEnded {
            reason: RestEndReason::Completed
        })
    );

    assert!(!h.manager.view().rest_showing);
    assert!(h.notifications.scheduled_ids().contains(&REST_ALERT_ID.to_string()));
    assert!(!h.manager.overlay().is_active());
}

#[tokio::test(start_paused = true)]
async fn dense_polling_does_not_double_fire() {
    let h = Harness::new();
    let mut events = h.manager.subscribe();
    h.manager.start_rest(5);

    for _ in 0..5_000 {
        h.advance_ms(1);
        h.manager.tick_rest();
        h.manager.tick_rest();
    }
    assert_eq!(pulses(&drain(&mut events)), vec![3, 2, 1]);
}

#[tokio::test(start_paused = true)]
async fn completion_in_background_skips_in_app_alert() {
    let h = Harness::new();
    h.manager.set_foreground(false);
    h.manager.start_rest(2);
    h.tick_rest_for_ms(2_500);
    assert!(!h.notifications.scheduled_ids().contains(&REST_ALERT_ID.to_string()));
}

#[tokio::test(start_paused = true)]
async fn completion_in_foreground_replaces_pending_notification() {
    let h = Harness::new();
    h.manager.start_rest(2);
    let cancels_before = h.notifications.cancelled.lock().unwrap().len();

    h.tick_rest_for_ms(2_500);

    assert_eq!(
        h.notifications.cancelled.lock().unwrap().len(),
        cancels_before + 1
    );
    assert_eq!(h.notifications.last_scheduled().unwrap().id, REST_ALERT_ID);
}

#[tokio::test(start_paused = true)]
async fn start_workout_twice_keeps_original_start() {
    let h = Harness::new();
    let mut events = h.manager.subscribe();

    h.manager.start_workout();
    let started_at = h.manager.view().workout_started_at;
    h.advance_ms(10_000);
    h.manager.start_workout();

    assert_eq!(h.manager.view().workout_started_at, started_at);
    h.manager.tick_elapsed();
    assert_eq!(h.manager.view().elapsed_seconds, 10);
    assert_eq!(drain(&mut events).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_and_reset_workout() {
    let h = Harness::new();
    h.manager.start_workout();
    h.advance_ms(42_000);
    h.manager.stop_workout();

    let view = h.manager.view();
    assert!(!view.is_running);
    assert_eq!(view.elapsed_seconds, 42);
    assert!(!h.store.load().is_running);
    assert!(!h.manager.tick_elapsed());

    h.manager.reset_workout();
    assert_eq!(h.manager.view().elapsed_seconds, 0);
}

#[tokio::test(start_paused = true)]
async fn zero_second_rest_never_starts() {
    let h = Harness::new();
    let mut events = h.manager.subscribe();
    h.manager.start_rest(0);

    assert!(!h.manager.view().rest_showing);
    assert!(drain(&mut events).is_empty());
    assert_eq!(h.surface.count("create"), 0);
    assert!(h.notifications.scheduled_ids().is_empty());
}

#[tokio::test(start_paused = true)]
async fn adding_time_starts_a_new_session() {
    let h = Harness::new();
    let mut events = h.manager.subscribe();
    h.manager.start_rest(30);
    let first_start = h.store.load().rest_started_at;

    h.advance_ms(20_000);
    h.manager.tick_rest();
    assert_close(h.manager.view().rest_remaining_seconds, 10.0, 0.1);

    h.manager.adjust_rest(15).await;

    let view = h.manager.view();
    assert!(view.rest_showing);
    assert_eq!(view.rest_duration_seconds, 25);
    assert_close(view.rest_remaining_seconds, 25.0, 0.1);

    let snapshot = h.store.load();
    assert_ne!(snapshot.rest_started_at, first_start);
    assert_eq!(snapshot.rest_started_at, Some(h.clock_now()));
    assert_eq!(snapshot.rest_duration_seconds, 25);

    let seen = drain(&mut events);
    assert!(seen.contains(&TimerEvent::RestEnded {
        reason: RestEndReason::Restarted
    }));
    assert!(matches!(
        seen.last(),
        Some(TimerEvent::RestStarted {
            duration_seconds: 25,
            ..
        })
    ));

    // old overlay closed before the new one opened
    assert_eq!(
        h.surface.ops().iter().filter(|op| !op.starts_with("update")).cloned().collect::<Vec<_>>(),
        vec!["create:o0", "end:o0", "create:o1"]
    );
    let last = h.notifications.last_scheduled().unwrap();
    assert_eq!(last.id, REST_COMPLETE_ID);
    assert_eq!(last.fire_after.as_secs(), 25);
}

#[tokio::test(start_paused = true)]
async fn large_negative_adjustment_ends_rest() {
    let h = Harness::new();
    let mut events = h.manager.subscribe();
    h.manager.start_rest(90);

    h.manager.adjust_rest(-999).await;

    assert!(!h.manager.view().rest_showing);
    assert!(!h.store.load().rest_showing);
    let seen = drain(&mut events);
    assert!(!seen.contains(&TimerEvent::RestCompleted));
    assert_eq!(
        seen.last(),
        Some(&TimerEvent::RestEnded {
            reason: RestEndReason::Skipped
        })
    );
}

#[tokio::test(start_paused = true)]
async fn rest_command_during_restart_delay_wins() {
    let h = Harness::new();
    h.manager.start_rest(60);

    tokio::join!(h.manager.adjust_rest(15), async { h.manager.end_rest() });

    assert!(!h.manager.view().rest_showing);
    assert_eq!(h.surface.count("create"), 1);
}

#[tokio::test(start_paused = true)]
async fn adjusting_without_rest_is_a_noop() {
    let h = Harness::new();
    h.manager.adjust_rest(30).await;
    assert!(!h.manager.view().rest_showing);
    assert!(h.surface.ops().is_empty());
}

#[tokio::test(start_paused = true)]
async fn notification_actions_skip_and_extend() {
    let h = Harness::new();
    h.manager.start_rest(60);

    h.manager
        .handle_notification_action(NotificationAction::AddTime)
        .await;
    assert_eq!(h.manager.view().rest_duration_seconds, 90);

    h.manager
        .handle_notification_action(NotificationAction::Skip)
        .await;
    assert!(!h.manager.view().rest_showing);
    assert!(h.notifications.cancelled.lock().unwrap().iter().all(|id| id == REST_COMPLETE_ID));
}

#[tokio::test(start_paused = true)]
async fn overlay_updates_once_per_displayed_second() {
    let h = Harness::new();
    h.manager.start_rest(5);
    assert_eq!(h.surface.ops(), vec!["create:o0"]);

    h.tick_rest_for_ms(1_000);
    assert_eq!(h.surface.count("update"), 1);
    let content = h.surface.last_content().unwrap();
    assert_eq!(content.rest_remaining_seconds, 4);
    assert!(content.is_resting);
    assert!(content.rest_ends_at.is_some());
    assert_eq!(content.workout_label, "Push Day");
}

#[tokio::test(start_paused = true)]
async fn exercise_change_refreshes_only_a_live_overlay() {
    let h = Harness::new();
    h.manager.set_exercise(Exercise::new("Bench Press").with_rest(120));
    assert!(h.surface.ops().is_empty());
    assert_eq!(h.manager.next_rest_seconds(), 120);

    h.manager.start_rest(h.manager.next_rest_seconds());
    h.manager.set_exercise(Exercise::new("Incline Press"));
    assert_eq!(h.surface.ops(), vec!["create:o0", "update:o0"]);
    assert_eq!(
        h.surface.last_content().unwrap().current_exercise_label,
        "Incline Press"
    );
    assert_eq!(h.manager.next_rest_seconds(), 90);
}

#[tokio::test(start_paused = true)]
async fn every_change_is_persisted_and_published() {
    let h = Harness::new();
    let mut view_rx = h.manager.watch();

    h.manager.start_workout();
    assert!(view_rx.has_changed().unwrap());
    assert!(view_rx.borrow_and_update().is_running);
    assert!(h.store.load().is_running);

    h.manager.start_rest(45);
    assert!(view_rx.borrow_and_update().rest_showing);
    let snapshot = h.store.load();
    assert!(snapshot.rest_showing);
    assert_eq!(snapshot.rest_duration_seconds, 45);
}

#[tokio::test(start_paused = true)]
async fn tickers_drive_the_countdown() {
    let h = Harness::new();
    h.manager.start_rest(90);

    h.advance_ms(30_000);
    // let the 10 Hz ticker run on the paused runtime
    tokio::time::sleep(std::time::Duration::from_millis(250)).await;

    assert_close(h.manager.view().rest_remaining_seconds, 60.0, 0.1);
}

#[tokio::test(start_paused = true)]
async fn persist_writes_without_arming_notifications() {
    let h = Harness::new();
    h.manager.start_rest(90);
    let scheduled_before = h.notifications.scheduled_ids().len();

    h.manager.persist();

    assert_eq!(h.notifications.scheduled_ids().len(), scheduled_before);
    assert_eq!(h.store.load().rest_duration_seconds, 90);
}

/// Store that parks the first write after `hold` until released
#[derive(Debug, Default)]
struct GatedStore {
    inner: MemoryStore,
    gate: Mutex<Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>>,
}

impl GatedStore {
    fn hold(&self) -> (mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *self.gate.lock().unwrap() = Some((entered_tx, release_rx));
        (entered_rx, release_tx)
    }
}

impl KeyValueStore for GatedStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let gate = self.gate.lock().unwrap().take();
        if let Some((entered, release)) = gate {
            entered.send(()).unwrap();
            release.recv().unwrap();
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }
}

#[test]
fn persist_cannot_overwrite_a_later_commit() {
    let kv = Arc::new(GatedStore::default());
    let h = Harness::with_store(kv.clone(), t0());
    h.manager.start_workout();

    let (entered, release) = kv.hold();
    let persisting = {
        let manager = h.manager.clone();
        thread::spawn(move || manager.persist())
    };
    entered.recv().unwrap();

    let stopping = {
        let manager = h.manager.clone();
        thread::spawn(move || manager.stop_workout())
    };
    thread::sleep(Duration::from_millis(50));
    release.send(()).unwrap();

    persisting.join().unwrap();
    stopping.join().unwrap();

    let snapshot = h.store.load();
    assert!(!snapshot.is_running);
    assert_eq!(snapshot.workout_started_at, None);
}
