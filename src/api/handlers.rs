//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{extract::State, response::Json};
use tracing::info;

use super::{
    context::AppContext,
    responses::{
        AdjustRestRequest, ApiResponse, ExerciseRequest, HealthResponse, OverlayResponse,
        StartRestRequest, StatusResponse,
    },
};
use crate::{services::NotificationAction, state::Exercise};

/// Handle POST /workout/start
pub async fn start_workout_handler(State(ctx): State<Arc<AppContext>>) -> Json<ApiResponse> {
    let was_running = ctx.manager.view().is_running;
    ctx.manager.start_workout();
    let timer = ctx.manager.view();
    if was_running {
        Json(ApiResponse::unchanged("Workout already running", timer))
    } else {
        info!("Workout start requested");
        Json(ApiResponse::ok("Workout started", timer))
    }
}

/// Handle POST /workout/stop
pub async fn stop_workout_handler(State(ctx): State<Arc<AppContext>>) -> Json<ApiResponse> {
    ctx.manager.stop_workout();
    Json(ApiResponse::ok("Workout stopped", ctx.manager.view()))
}

/// Handle POST /workout/reset
pub async fn reset_workout_handler(State(ctx): State<Arc<AppContext>>) -> Json<ApiResponse> {
    ctx.manager.reset_workout();
    Json(ApiResponse::ok("Workout reset", ctx.manager.view()))
}

/// Handle POST /rest/start
pub async fn start_rest_handler(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<StartRestRequest>,
) -> Json<ApiResponse> {
    let seconds = match request.seconds {
        // zero or less ends the current rest
        Some(seconds) => u32::try_from(seconds.max(0)).unwrap_or(u32::MAX),
        None => ctx.manager.next_rest_seconds(),
    };
    ctx.manager.start_rest(seconds);
    let message = if seconds == 0 {
        "Rest ended".to_string()
    } else {
        format!("Rest started for {}s", seconds)
    };
    Json(ApiResponse::ok(message, ctx.manager.view()))
}

/// Handle POST /rest/adjust
pub async fn adjust_rest_handler(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<AdjustRestRequest>,
) -> Json<ApiResponse> {
    if !ctx.manager.view().rest_showing {
        return Json(ApiResponse::unchanged("No rest to adjust", ctx.manager.view()));
    }
    ctx.manager.adjust_rest(request.delta_seconds).await;
    Json(ApiResponse::ok(
        format!("Rest adjusted by {}s", request.delta_seconds),
        ctx.manager.view(),
    ))
}

/// Handle POST /rest/end
pub async fn end_rest_handler(State(ctx): State<Arc<AppContext>>) -> Json<ApiResponse> {
    ctx.manager.end_rest();
    Json(ApiResponse::ok("Rest ended", ctx.manager.view()))
}

/// Handle POST /exercise
pub async fn exercise_handler(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<ExerciseRequest>,
) -> Json<ApiResponse> {
    let message = format!("Current exercise: {}", request.name);
    ctx.manager.set_exercise(Exercise {
        name: request.name,
        rest_seconds: request.rest_seconds,
    });
    Json(ApiResponse::ok(message, ctx.manager.view()))
}

/// Handle POST /lifecycle/background
pub async fn background_handler(State(ctx): State<Arc<AppContext>>) -> Json<ApiResponse> {
    ctx.lifecycle.enter_background();
    Json(ApiResponse::ok("Entered background", ctx.manager.view()))
}

/// Handle POST /lifecycle/foreground
pub async fn foreground_handler(State(ctx): State<Arc<AppContext>>) -> Json<ApiResponse> {
    ctx.lifecycle.enter_foreground().await;
    Json(ApiResponse::ok("Entered foreground", ctx.manager.view()))
}

/// Handle POST /notification/skip
pub async fn notification_skip_handler(State(ctx): State<Arc<AppContext>>) -> Json<ApiResponse> {
    ctx.manager
        .handle_notification_action(NotificationAction::Skip)
        .await;
    Json(ApiResponse::ok("Rest skipped", ctx.manager.view()))
}

/// Handle POST /notification/add-time
pub async fn notification_add_time_handler(
    State(ctx): State<Arc<AppContext>>,
) -> Json<ApiResponse> {
    ctx.manager
        .handle_notification_action(NotificationAction::AddTime)
        .await;
    Json(ApiResponse::ok(
        format!("Added {}s", ctx.manager.settings().add_time_seconds),
        ctx.manager.view(),
    ))
}

/// Handle GET /status
pub async fn status_handler(State(ctx): State<Arc<AppContext>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        timer: ctx.manager.view(),
        phase: ctx.lifecycle.phase(),
        overlay_active: ctx.manager.overlay().is_active(),
        uptime: ctx.uptime(),
        port: ctx.port,
        host: ctx.host.clone(),
    })
}

/// Handle GET /overlay
pub async fn overlay_handler(State(ctx): State<Arc<AppContext>>) -> Json<OverlayResponse> {
    Json(OverlayResponse {
        overlay: ctx.manager.overlay().current(),
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
