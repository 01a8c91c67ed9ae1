//! Structured logging for the salon gate.
//!
//! Subscriber setup plus the startup helpers used while the server is
//! assembled: step timers and banner/step/warning macros.

use std::time::Instant;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `config.level` when both are set.
pub fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Measures one startup step and logs its duration.
///
/// ```rust,ignore
/// let timer = OpTimer::new("server", "request_gate");
/// let gate = RequestGate::from_config(&config.gate)?;
/// timer.finish();
/// ```
#[derive(Debug)]
pub struct OpTimer {
    /// Component being timed (e.g., "server").
    component: String,
    /// Operation being performed (e.g., "request_gate").
    operation: String,
    start: Instant,
}

impl OpTimer {
    #[must_use]
    pub fn new(component: impl Into<String>, operation: impl Into<String>) -> Self {
        let component = component.into();
        let operation = operation.into();

        tracing::debug!(
            component = %component,
            operation = %operation,
            "Operation started"
        );

        Self {
            component,
            operation,
            start: Instant::now(),
        }
    }

    /// Finishes the timer and logs the duration.
    pub fn finish(self) {
        let duration_ms = self.start.elapsed().as_millis();

        tracing::info!(
            component = %self.component,
            operation = %self.operation,
            duration_ms = duration_ms,
            "Operation completed"
        );
    }
}

/// Log one numbered initialization step.
///
/// ```rust,ignore
/// log_init_step!(1, 3, "Request Gate", "7 public rules");
/// ```
#[macro_export]
macro_rules! log_init_step {
    ($step:expr, $total:expr, $name:expr, $detail:expr) => {
        tracing::info!(
            step = $step,
            total = $total,
            "[{}/{}] {} - {}",
            $step,
            $total,
            $name,
            $detail
        );
    };
    ($step:expr, $total:expr, $name:expr) => {
        tracing::info!(step = $step, total = $total, "[{}/{}] {}", $step, $total, $name);
    };
}

/// Log a warning during initialization.
#[macro_export]
macro_rules! log_init_warning {
    ($msg:expr) => {
        tracing::warn!("⚠️  {}", $msg);
    };
    ($msg:expr, $($arg:tt)*) => {
        tracing::warn!("⚠️  {}", format!($msg, $($arg)*));
    };
}

/// Log successful completion of a major phase.
#[macro_export]
macro_rules! log_success {
    ($msg:expr) => {
        tracing::info!("✅ {}", $msg);
    };
    ($msg:expr, $($arg:tt)*) => {
        tracing::info!("✅ {}", format!($msg, $($arg)*));
    };
}

/// Log a startup banner.
#[macro_export]
macro_rules! log_banner {
    ($title:expr) => {
        tracing::info!("═══════════════════════════════════════════════════");
        tracing::info!("  {}", $title);
        tracing::info!("═══════════════════════════════════════════════════");
    };
    ($title:expr, $subtitle:expr) => {
        tracing::info!("═══════════════════════════════════════════════════");
        tracing::info!("  {}", $title);
        tracing::info!("  {}", $subtitle);
        tracing::info!("═══════════════════════════════════════════════════");
    };
}
