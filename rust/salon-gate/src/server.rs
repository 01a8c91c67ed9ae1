//! HTTP server setup and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, Router};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::api;
use crate::config::AppConfig;
use crate::gate::{gate_middleware, RequestGate};
use crate::logging::OpTimer;
use crate::proxy::{self, Upstream};
use crate::{log_banner, log_init_step, log_init_warning, log_success, AppState};

/// Salon Gate version (from Cargo.toml).
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Create the application with all routes and middleware.
///
/// The gate is installed exactly once, around the whole router, so health
/// probes, the upstream fallback and any future route share one policy.
pub fn create_app(config: AppConfig) -> anyhow::Result<Router> {
    let overall_timer = OpTimer::new("server", "create_app");

    log_banner!(
        format!("🚪 Salon Gate v{VERSION}"),
        format!(
            "Session cookie: {} | Sign-in: {}?{}=...",
            config.gate.session_cookie, config.gate.sign_in_path, config.gate.resume_param
        )
    );

    // [1/3] Compile the admission policy
    let step_timer = OpTimer::new("server", "request_gate");
    let gate = Arc::new(RequestGate::from_config(&config.gate)?);
    log_init_step!(
        1,
        3,
        "Request Gate",
        format!(
            "🔒 {} public rules, {} exemptions",
            gate.routes().len(),
            gate.exemptions().len()
        )
    );
    tracing::debug!(rules = ?gate.routes().describe(), "Public route table");
    step_timer.finish();

    // [2/3] Upstream client
    let step_timer = OpTimer::new("server", "upstream");
    let upstream = match config.upstream.url.as_deref() {
        Some(url) => {
            let upstream = Upstream::new(
                url,
                Duration::from_secs(config.upstream.timeout_secs),
                config.server.max_body_bytes,
            )?;
            log_init_step!(2, 3, "Upstream", format!("🔁 {}", upstream.base_url()));
            Some(upstream)
        }
        None => {
            log_init_warning!("No upstream configured. Admitted requests will receive 502.");
            log_init_step!(2, 3, "Upstream", "🔁 Not configured");
            None
        }
    };
    step_timer.finish();

    // [3/3] Router with middleware
    let step_timer = OpTimer::new("server", "router");
    let timeout = Duration::from_secs(config.server.timeout_secs);
    let state = AppState {
        config: Arc::new(config),
        gate: Arc::clone(&gate),
        upstream,
    };

    let app = Router::new()
        .merge(api::create_router())
        .fallback(proxy::forward_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    timeout,
                ))
                .layer(axum::middleware::from_fn_with_state(gate, gate_middleware)),
        )
        .with_state(state);

    log_init_step!(3, 3, "Router", "🌐 Routes + middleware configured");
    step_timer.finish();

    overall_timer.finish();
    log_success!("Salon Gate server created successfully");

    Ok(app)
}
