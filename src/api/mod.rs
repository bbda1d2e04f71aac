//! HTTP API module
//!
//! Control surface for the timer: workout and rest commands, lifecycle
//! transitions from the host shell, and status queries.

pub mod context;
pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use context::AppContext;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/workout/start", post(start_workout_handler))
        .route("/workout/stop", post(stop_workout_handler))
        .route("/workout/reset", post(reset_workout_handler))
        .route("/rest/start", post(start_rest_handler))
        .route("/rest/adjust", post(adjust_rest_handler))
        .route("/rest/end", post(end_rest_handler))
        .route("/exercise", post(exercise_handler))
        .route("/lifecycle/background", post(background_handler))
        .route("/lifecycle/foreground", post(foreground_handler))
        .route("/notification/skip", post(notification_skip_handler))
        .route("/notification/add-time", post(notification_add_time_handler))
        .route("/status", get(status_handler))
        .route("/overlay", get(overlay_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}
