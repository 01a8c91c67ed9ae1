//! Salon Gate - Main Entry Point
//!
//! Front door for the salon booking web app: admits or redirects every
//! request, then forwards admitted ones to the upstream application.

use std::path::PathBuf;

use clap::Parser;
use mimalloc::MiMalloc;

use salon_gate::config::AppConfig;
use salon_gate::logging::init_tracing;
use salon_gate::server::create_app;

// Use mimalloc for better performance
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "salon-gate")]
#[command(about = "Salon Gate - public-route gate and sign-in redirect in front of the salon web app")]
#[command(version)]
struct Args {
    /// Host to bind to (overrides server.host).
    #[arg(long, env = "SALON_GATE_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides server.port).
    #[arg(short, long, env = "SALON_GATE_PORT")]
    port: Option<u16>,

    /// Log level (overrides logging.level).
    #[arg(long, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Config file path.
    #[arg(short, long, env = "SALON_GATE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AppConfig::load_with_overrides(args.config.as_deref(), |config| {
        if let Some(level) = args.log_level {
            config.logging.level = level;
        }
        if let Some(host) = args.host {
            config.server.host = host;
        }
        if let Some(port) = args.port {
            config.server.port = port;
        }
    })?;

    init_tracing(&config.logging);
    tracing::info!("Starting Salon Gate v{}", env!("CARGO_PKG_VERSION"));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = create_app(config)?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
