//! Salon Gate - front door for the salon booking web application.
//!
//! Every inbound request passes through one admission policy before it reaches
//! the web application:
//!
//! - static assets and health probes pass straight through
//! - public routes (landing, sign-in/up, auth and payment callbacks, booking
//!   pages, appointment lookups) pass
//! - everything else needs the session cookie, or is redirected to
//!   `/sign-in?redirect=<original path and query>`
//!
//! # Architecture
//!
//! - [`config`]: Configuration loading and validation
//! - [`gate`]: Route table, exemptions, session check, redirect directive
//! - [`proxy`]: Forwarding admitted requests to the upstream web app
//! - [`api`]: Health endpoints
//! - [`server`]: Router and middleware assembly
//! - [`logging`]: Tracing setup and startup helpers
//!
//! # Example
//!
//! ```rust,ignore
//! use salon_gate::{config::AppConfig, server::create_app};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load(None)?;
//!     let app = create_app(config)?;
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! The gate can also be layered onto an existing router:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use salon_gate::{config::GateConfig, gate::{gate_middleware, RequestGate}};
//!
//! let gate = Arc::new(RequestGate::from_config(&GateConfig::default())?);
//! let app = my_router.layer(axum::middleware::from_fn_with_state(gate, gate_middleware));
//! ```

#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod api;
pub mod config;
pub mod gate;
pub mod logging;
pub mod proxy;
pub mod server;

use std::sync::Arc;

use config::AppConfig;
use gate::RequestGate;
use proxy::Upstream;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// The admission policy.
    pub gate: Arc<RequestGate>,
    /// Upstream web application, if configured.
    pub upstream: Option<Upstream>,
}
