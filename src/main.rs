//! Workout Timer - workout clock and rest timer daemon
//!
//! This is the main entry point for the workout-timer application.

use std::sync::Arc;
use tokio::{net::TcpListener, sync::mpsc};
use tracing::{info, warn};

use workout_timer::{
    api::{create_router, AppContext},
    clock::SystemClock,
    config::Config,
    services::{
        check_notify_send_available, NotificationScheduler, NotifySendBackend, OverlayPublisher,
        StatusFileSurface,
    },
    state::WorkoutTimerManager,
    store::{FileStore, TimerStateStore},
    tasks::{feedback_task, notification_action_task, LifecycleCoordinator},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("workout_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting workout-timer v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, rest={}s, data_dir={}",
        config.host,
        config.port,
        config.rest,
        config.data_dir().display()
    );

    let settings = config.timer_settings();
    let store = TimerStateStore::new(Arc::new(FileStore::open(config.state_dir())?));

    // Notifications are optional; without them the in-app countdown still works
    let (action_tx, action_rx) = mpsc::unbounded_channel();
    let notifications = if config.no_notifications {
        info!("Notifications disabled by flag");
        NotificationScheduler::disabled()
    } else {
        match check_notify_send_available().await {
            Ok(()) => NotificationScheduler::new(
                Arc::new(NotifySendBackend::new("Workout Timer", action_tx)),
                settings.add_time_seconds,
            ),
            Err(e) => {
                warn!("{}, continuing without notifications", e);
                NotificationScheduler::disabled()
            }
        }
    };

    let overlay_path = config.overlay_file();
    info!("Overlay status file: {}", overlay_path.display());
    let overlay = OverlayPublisher::new(Arc::new(StatusFileSurface::new(overlay_path)));

    let manager = WorkoutTimerManager::new(
        Arc::new(SystemClock),
        settings,
        store.clone(),
        notifications,
        overlay,
    );
    let lifecycle = Arc::new(LifecycleCoordinator::new(Arc::clone(&manager), store));
    lifecycle.cold_start().await;

    tokio::spawn(notification_action_task(Arc::clone(&manager), action_rx));
    tokio::spawn(feedback_task(Arc::clone(&manager)));

    let context = Arc::new(AppContext::new(
        Arc::clone(&manager),
        Arc::clone(&lifecycle),
        config.host.clone(),
        config.port,
    ));
    let app = create_router(context);

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /workout/start|stop|reset   - Workout clock");
    info!("  POST /rest/start|adjust|end      - Rest countdown");
    info!("  POST /exercise                   - Set current exercise");
    info!("  POST /lifecycle/background|foreground");
    info!("  POST /notification/skip|add-time");
    info!("  GET  /status | /overlay | /health");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        signal = shutdown_signal() => {
            info!("Received {}, saving timer state", signal);
        }
    }

    // flush before the process goes away; the next cold start restores.
    // No notification is armed, its task would die with the process.
    manager.persist();
    manager.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
