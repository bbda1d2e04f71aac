//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{services::OverlayContent, state::TimerView, tasks::AppPhase};

/// Response for every command endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerView,
}

impl ApiResponse {
    pub fn new(status: &str, message: impl Into<String>, timer: TimerView) -> Self {
        Self {
            status: status.to_string(),
            message: message.into(),
            timestamp: Utc::now(),
            timer,
        }
    }

    pub fn ok(message: impl Into<String>, timer: TimerView) -> Self {
        Self::new("ok", message, timer)
    }

    /// The command was valid but changed nothing
    pub fn unchanged(message: impl Into<String>, timer: TimerView) -> Self {
        Self::new("unchanged", message, timer)
    }
}

/// Status response with lifecycle and server information
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub timer: TimerView,
    pub phase: AppPhase,
    pub overlay_active: bool,
    pub uptime: String,
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayResponse {
    pub overlay: Option<OverlayContent>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Body of POST /rest/start
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartRestRequest {
    /// Explicit duration; the current exercise's rest otherwise
    #[serde(default)]
    pub seconds: Option<i64>,
}

/// Body of POST /rest/adjust
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustRestRequest {
    pub delta_seconds: i64,
}

/// Body of POST /exercise
#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseRequest {
    pub name: String,
    #[serde(default)]
    pub rest_seconds: Option<u32>,
}
