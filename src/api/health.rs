use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiResponse, AppState};

pub const SERVICE_NAME: &str = "animelist";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthReadinessChecks {
    pub database: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthReadyResponse {
    pub ready: bool,
    pub checks: HealthReadinessChecks,
}

/// `GET /health`
///
/// Liveness probe. Never touches the database.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::success(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    }))
}

/// `GET /health/ready`
///
/// Readiness probe that checks database connectivity.
pub async fn health_ready(State(state): State<Arc<AppState>>) -> Response {
    let db_ready = state.store().ping().await.is_ok();
    readiness(db_ready).into_response()
}

fn readiness(db_ready: bool) -> (StatusCode, Json<ApiResponse<HealthReadyResponse>>) {
    let report = HealthReadyResponse {
        ready: db_ready,
        checks: HealthReadinessChecks { database: db_ready },
    };

    if db_ready {
        return (StatusCode::OK, Json(ApiResponse::success(report)));
    }

    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiResponse {
            success: false,
            data: Some(report),
            error: Some("database unavailable".to_string()),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_readiness_is_not_a_success() {
        let (status, Json(body)) = readiness(false);

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!body.success);
        assert_eq!(body.error.as_deref(), Some("database unavailable"));
        assert!(!body.data.unwrap().checks.database);
    }

    #[test]
    fn passing_readiness_is_a_success() {
        let (status, Json(body)) = readiness(true);

        assert_eq!(status, StatusCode::OK);
        assert!(body.success);
        assert!(body.data.unwrap().ready);
    }
}
