//! Liveness check.

use axum::Json;
use serde::Serialize;

pub const HEALTH_MESSAGE: &str = "SamaCarnet API is running";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `GET /health`
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: HEALTH_MESSAGE,
    })
}
