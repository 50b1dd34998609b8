//! Health check endpoints for Kubernetes-style probes.
//!
//! - `/livez` - Basic liveness probe (immediate 200, no checks)
//! - `/readyz` - Readiness probe (pings the storage backend)

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

/// Readiness report.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub backend: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /livez - Basic liveness probe.
///
/// Returns 200 immediately. Used to check if the server is accepting connections.
pub async fn livez() -> StatusCode {
    StatusCode::OK
}

/// GET /readyz - Readiness probe.
///
/// Returns 200 when the store answers a ping, 503 otherwise.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let backend = state.backend_name();

    match state.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthStatus {
                healthy: true,
                backend,
                error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!(backend, error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthStatus {
                    healthy: false,
                    backend,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
