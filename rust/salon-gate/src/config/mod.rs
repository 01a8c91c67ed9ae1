//! Configuration management for the salon gate.
//!
//! Configuration is loaded from defaults, an optional config file and
//! environment variables, then checked by [`ConfigValidator`]:
//!
//! ```rust,ignore
//! use salon_gate::config::{AppConfig, ConfigValidator};
//!
//! let config = AppConfig::load(None)?;
//! ConfigValidator::validate(&config)?;
//! ```
//!
//! # Environment
//!
//! Any field can be set with `SALON_GATE__<SECTION>__<FIELD>`, for example
//! `SALON_GATE__GATE__SIGN_IN_PATH=/login`. Two shortcuts are also read:
//!
//! - `SESSION_COOKIE_NAME` overrides `gate.session_cookie`
//! - `UPSTREAM_URL` overrides `upstream.url`

pub mod error;
pub mod validator;

pub use error::{ConfigResult, ConfigurationError};
pub use validator::ConfigValidator;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::gate::DEFAULT_RESUME_PARAM;

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Admission policy.
    #[serde(default)]
    pub gate: GateConfig,
    /// Upstream web application that admitted requests are forwarded to.
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load and validate configuration.
    ///
    /// Sources, lowest precedence first:
    /// 1. Default values
    /// 2. `config/salon-gate.{yaml,toml,json}` or the file given in `path`
    /// 3. `SALON_GATE__*` environment variables
    /// 4. `SESSION_COOKIE_NAME` / `UPSTREAM_URL`
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_with_overrides(path, |_| {})
    }

    /// Load configuration, apply `overrides` (command-line flags), then
    /// validate the result.
    pub fn load_with_overrides(
        path: Option<&Path>,
        overrides: impl FnOnce(&mut Self),
    ) -> anyhow::Result<Self> {
        let mut config = Self::load_unchecked(path)?;
        overrides(&mut config);

        ConfigValidator::validate(&config)
            .map_err(|e| anyhow::anyhow!("Configuration validation failed:\n\n{e}"))?;

        Ok(config)
    }

    /// Load configuration without validation.
    pub fn load_unchecked(path: Option<&Path>) -> anyhow::Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let file_source = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("config/salon-gate").required(false),
        };

        let settings = config::Config::builder()
            .add_source(file_source)
            .add_source(
                config::Environment::with_prefix("SALON_GATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;

        if let Ok(name) = std::env::var("SESSION_COOKIE_NAME") {
            app_config.gate.session_cookie = name;
        }
        if let Ok(url) = std::env::var("UPSTREAM_URL") {
            app_config.upstream.url = Some(url);
        }

        Ok(app_config)
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Largest request body forwarded upstream, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Admission policy configuration.
///
/// This is the only place the public routes, exemptions, cookie name and
/// resume parameter are defined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Name of the session cookie set by the session issuer.
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    /// Sign-in page unauthenticated requests are sent to.
    #[serde(default = "default_sign_in_path")]
    pub sign_in_path: String,
    /// Query parameter carrying the original path + query.
    #[serde(default = "default_resume_param")]
    pub resume_param: String,
    /// Public literal routes; each also covers `<route>/...` except `/`.
    #[serde(default = "default_public_prefixes")]
    pub public_prefixes: Vec<String>,
    /// Public route templates; `*` is one path segment.
    #[serde(default = "default_public_templates")]
    pub public_templates: Vec<String>,
    /// Path prefixes that bypass the gate.
    #[serde(default = "default_exempt_prefixes")]
    pub exempt_prefixes: Vec<String>,
    /// Exact paths that bypass the gate.
    #[serde(default = "default_exempt_paths")]
    pub exempt_paths: Vec<String>,
    /// File extensions that bypass the gate.
    #[serde(default = "default_exempt_extensions")]
    pub exempt_extensions: Vec<String>,
}

fn default_session_cookie() -> String {
    "better-auth.session_token".to_string()
}

fn default_sign_in_path() -> String {
    "/sign-in".to_string()
}

fn default_resume_param() -> String {
    DEFAULT_RESUME_PARAM.to_string()
}

fn default_public_prefixes() -> Vec<String> {
    ["/", "/sign-in", "/sign-up", "/api/auth", "/api/polar"]
        .map(String::from)
        .to_vec()
}

fn default_public_templates() -> Vec<String> {
    ["/*/book", "/*/appointment/*"].map(String::from).to_vec()
}

fn default_exempt_prefixes() -> Vec<String> {
    ["/_next/static", "/_next/image"].map(String::from).to_vec()
}

fn default_exempt_paths() -> Vec<String> {
    ["/favicon.ico", "/health", "/ready"].map(String::from).to_vec()
}

fn default_exempt_extensions() -> Vec<String> {
    ["svg", "png", "jpg", "jpeg", "gif", "webp", "ico"]
        .map(String::from)
        .to_vec()
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            session_cookie: default_session_cookie(),
            sign_in_path: default_sign_in_path(),
            resume_param: default_resume_param(),
            public_prefixes: default_public_prefixes(),
            public_templates: default_public_templates(),
            exempt_prefixes: default_exempt_prefixes(),
            exempt_paths: default_exempt_paths(),
            exempt_extensions: default_exempt_extensions(),
        }
    }
}

/// Upstream web application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL, e.g. `http://127.0.0.1:3001`. Unset means no forwarding.
    pub url: Option<String>,
    /// Per-request upstream timeout in seconds.
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

fn default_upstream_timeout() -> u64 {
    25
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_upstream_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to use JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
