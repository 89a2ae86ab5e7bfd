use crate::actors::{fetch_snapshot, UserListMessage, UserListSnapshot};
use crate::connectivity::Connectivity;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use ractor::ActorRef;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: HealthChecks,
}

/// Individual health checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthChecks {
    pub user_list: CheckResult,
    pub connectivity: CheckResult,
}

/// Result of an individual check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Liveness probe response (minimal, just indicates the process is running)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
}

/// Readiness probe response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Shared state for every HTTP handler
#[derive(Clone)]
pub struct AppState {
    pub user_list: ActorRef<UserListMessage>,
    pub connectivity: Connectivity,
    pub start_time: std::time::Instant,
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/livez", get(liveness_check))
        .route("/readyz", get(readiness_check))
}

fn user_list_check(snapshot: &UserListSnapshot) -> CheckResult {
    match snapshot.page_error.as_deref() {
        Some(error) => CheckResult {
            status: HealthStatus::Degraded,
            message: Some(format!("Last page load failed: {}", error)),
        },
        None => CheckResult {
            status: HealthStatus::Healthy,
            message: None,
        },
    }
}

/// Main health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();

    let user_list = match fetch_snapshot(&state.user_list, Duration::from_secs(5)).await {
        Ok(snapshot) => user_list_check(&snapshot),
        Err(e) => CheckResult {
            status: HealthStatus::Unhealthy,
            message: Some(e.to_string()),
        },
    };

    // Being offline degrades the service but does not make it unusable
    let connectivity = if state.connectivity.is_online() {
        CheckResult {
            status: HealthStatus::Healthy,
            message: None,
        }
    } else {
        CheckResult {
            status: HealthStatus::Degraded,
            message: Some("GitHub API unreachable".to_string()),
        }
    };

    let overall_status = if user_list.status == HealthStatus::Unhealthy {
        HealthStatus::Unhealthy
    } else if user_list.status == HealthStatus::Degraded
        || connectivity.status == HealthStatus::Degraded
    {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        checks: HealthChecks {
            user_list,
            connectivity,
        },
    };

    (status_code, Json(response))
}

async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(LivenessResponse {
            status: "alive".to_string(),
        }),
    )
}

/// Ready once the user list actor answers promptly
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let response = match fetch_snapshot(&state.user_list, Duration::from_secs(1)).await {
        Ok(_) => ReadinessResponse {
            ready: true,
            message: None,
        },
        Err(e) => ReadinessResponse {
            ready: false,
            message: Some(format!("Not ready - {}", e)),
        },
    };

    let status_code = if response.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
