//! Health check endpoints.
//!
//! Both paths are in the default exemption list, so probes never need a
//! session cookie.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Create the health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
}

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Basic health check.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness check response.
#[derive(Debug, Serialize)]
struct ReadinessResponse {
    status: &'static str,
    gate: GateStatus,
    upstream: Option<String>,
    limits: Limits,
}

#[derive(Debug, Serialize)]
struct GateStatus {
    public_rules: usize,
    exemptions: usize,
    session_cookie: String,
    resume_param: String,
}

#[derive(Debug, Serialize)]
struct Limits {
    request_timeout_secs: u64,
    upstream_timeout_secs: u64,
    max_body_bytes: usize,
}

/// Readiness check. Reports `degraded` when no upstream is configured.
async fn readiness_check(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let upstream = state.upstream.as_ref().map(|u| u.base_url().to_string());

    Json(ReadinessResponse {
        status: if upstream.is_some() { "ready" } else { "degraded" },
        gate: GateStatus {
            public_rules: state.gate.routes().len(),
            exemptions: state.gate.exemptions().len(),
            session_cookie: state.gate.session_cookie().to_string(),
            resume_param: state.gate.resume_param().to_string(),
        },
        upstream,
        limits: Limits {
            request_timeout_secs: state.config.server.timeout_secs,
            upstream_timeout_secs: state.config.upstream.timeout_secs,
            max_body_bytes: state.config.server.max_body_bytes,
        },
    })
}
