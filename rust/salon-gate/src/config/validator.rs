//! Configuration validation.
//!
//! Rejects settings that would make the gate misbehave at runtime, most
//! importantly a sign-in page that is itself protected (redirect loop).

use tracing_subscriber::EnvFilter;

use super::error::{ConfigResult, ConfigurationError};
use super::{AppConfig, GateConfig, LoggingConfig, ServerConfig, UpstreamConfig};
use crate::gate::{RouteTable, Visibility};
use crate::gate::rules::compile_template;

/// Validates an [`AppConfig`] before the server starts.
///
/// Every problem is reported, not just the first one.
#[derive(Debug)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the entire application configuration.
    pub fn validate(config: &AppConfig) -> ConfigResult<()> {
        let results = [
            Self::validate_server(&config.server),
            Self::validate_gate(&config.gate),
            Self::validate_upstream(&config.upstream),
            Self::validate_logging(&config.logging),
        ];

        ConfigurationError::collect(results.into_iter().filter_map(Result::err).collect())
    }

    /// Validate server limits.
    pub fn validate_server(server: &ServerConfig) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if server.timeout_secs == 0 {
            errors.push(ConfigurationError::invalid(
                "server.timeout_secs is 0",
                "Set SALON_GATE__SERVER__TIMEOUT_SECS to a positive number of seconds",
            ));
        }
        if server.max_body_bytes == 0 {
            errors.push(ConfigurationError::invalid(
                "server.max_body_bytes is 0, so no request body could be forwarded",
                "Set SALON_GATE__SERVER__MAX_BODY_BYTES to a positive byte count",
            ));
        }

        ConfigurationError::collect(errors)
    }

    /// Validate the admission policy.
    pub fn validate_gate(gate: &GateConfig) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if gate.session_cookie.is_empty() {
            errors.push(ConfigurationError::missing_required(
                "gate.session_cookie",
                "Detecting signed-in users",
                "SESSION_COOKIE_NAME",
            ));
        } else if !is_cookie_name(&gate.session_cookie) {
            errors.push(ConfigurationError::invalid(
                format!(
                    "gate.session_cookie '{}' is not a valid cookie name",
                    gate.session_cookie
                ),
                "Use only visible ASCII characters, without spaces or any of ()<>@,;:\\\"/[]?={}",
            ));
        }

        if gate.resume_param.trim().is_empty() {
            errors.push(ConfigurationError::missing_required(
                "gate.resume_param",
                "Returning users to the page they asked for after sign-in",
                "SALON_GATE__GATE__RESUME_PARAM",
            ));
        }

        if !gate.sign_in_path.starts_with('/') {
            errors.push(ConfigurationError::invalid(
                format!("gate.sign_in_path '{}' is not an absolute path", gate.sign_in_path),
                "Set SALON_GATE__GATE__SIGN_IN_PATH to a path starting with '/'",
            ));
        }

        for (field, routes) in [
            ("gate.public_prefixes", &gate.public_prefixes),
            ("gate.exempt_prefixes", &gate.exempt_prefixes),
            ("gate.exempt_paths", &gate.exempt_paths),
        ] {
            for route in routes.iter().filter(|r| !r.starts_with('/')) {
                errors.push(ConfigurationError::invalid(
                    format!("{field} entry '{route}' is not an absolute path"),
                    "Every route must start with '/'",
                ));
            }
        }

        let mut templates_ok = true;
        for template in &gate.public_templates {
            if let Err(e) = compile_template(template) {
                templates_ok = false;
                errors.push(ConfigurationError::invalid(
                    e.to_string(),
                    "Write templates like '/*/book': '/'-separated, '*' for one whole segment",
                ));
            }
        }

        if templates_ok && gate.sign_in_path.starts_with('/') {
            if let Ok(table) = RouteTable::new(&gate.public_prefixes, &gate.public_templates) {
                if table.classify(&gate.sign_in_path) == Visibility::Protected {
                    errors.push(ConfigurationError::incompatible(
                        format!("gate.sign_in_path={}", gate.sign_in_path),
                        "gate.public_prefixes",
                        "The sign-in page is not a public route, so every redirect to it \
                        would be redirected again. Add it to gate.public_prefixes.",
                    ));
                }
            }
        }

        ConfigurationError::collect(errors)
    }

    /// Validate the upstream target.
    pub fn validate_upstream(upstream: &UpstreamConfig) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if let Some(raw) = &upstream.url {
            match url::Url::parse(raw) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                Ok(url) => errors.push(ConfigurationError::invalid(
                    format!("upstream.url uses unsupported scheme '{}'", url.scheme()),
                    "Use an http:// or https:// URL in UPSTREAM_URL",
                )),
                Err(e) => errors.push(ConfigurationError::invalid(
                    format!("upstream.url '{raw}' is not a valid URL: {e}"),
                    "Set UPSTREAM_URL to something like http://127.0.0.1:3001",
                )),
            }
        }

        if upstream.timeout_secs == 0 {
            errors.push(ConfigurationError::invalid(
                "upstream.timeout_secs is 0",
                "Set SALON_GATE__UPSTREAM__TIMEOUT_SECS to a positive number of seconds",
            ));
        }

        ConfigurationError::collect(errors)
    }

    /// Validate the log filter.
    pub fn validate_logging(logging: &LoggingConfig) -> ConfigResult<()> {
        EnvFilter::try_new(&logging.level)
            .map(|_| ())
            .map_err(|e| {
                ConfigurationError::invalid(
                    format!("logging.level '{}' is not a valid filter: {e}", logging.level),
                    "Use a level such as 'info' or a directive like 'salon_gate=debug,tower_http=info'",
                )
            })
    }
}

/// RFC 6265 cookie-name token.
fn is_cookie_name(name: &str) -> bool {
    const SEPARATORS: &[u8] = b"()<>@,;:\\\"/[]?={} \t";
    name.bytes()
        .all(|b| b.is_ascii_graphic() && !SEPARATORS.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ConfigValidator::validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_protected_sign_in_page_is_rejected() {
        let gate = GateConfig {
            sign_in_path: "/login".to_string(),
            ..GateConfig::default()
        };
        let err = ConfigValidator::validate_gate(&gate).unwrap_err();
        assert!(matches!(err, ConfigurationError::Incompatible { .. }));
    }

    #[test]
    fn test_moved_sign_in_page_with_matching_prefix_is_valid() {
        let mut gate = GateConfig {
            sign_in_path: "/login".to_string(),
            ..GateConfig::default()
        };
        gate.public_prefixes.push("/login".to_string());
        assert!(ConfigValidator::validate_gate(&gate).is_ok());
    }

    #[test]
    fn test_bad_cookie_names() {
        for name in ["session token", "a;b", "tok=en", "naïve"] {
            let gate = GateConfig {
                session_cookie: name.to_string(),
                ..GateConfig::default()
            };
            assert!(ConfigValidator::validate_gate(&gate).is_err(), "{name}");
        }
        assert!(is_cookie_name("__Secure-better-auth.session_token"));
    }

    #[test]
    fn test_empty_cookie_and_resume_param_are_missing() {
        let gate = GateConfig {
            session_cookie: String::new(),
            resume_param: " ".to_string(),
            ..GateConfig::default()
        };
        let err = ConfigValidator::validate_gate(&gate).unwrap_err();
        assert_eq!(err.count(), 2);
        assert!(err.to_string().contains("SESSION_COOKIE_NAME"));
    }

    #[test]
    fn test_relative_routes_and_bad_templates() {
        let gate = GateConfig {
            public_prefixes: vec!["/".to_string(), "/sign-in".to_string(), "api/auth".to_string()],
            public_templates: vec!["/salon-*/book".to_string()],
            exempt_paths: vec!["favicon.ico".to_string()],
            ..GateConfig::default()
        };
        let err = ConfigValidator::validate_gate(&gate).unwrap_err();
        assert_eq!(err.count(), 3);
    }

    #[test]
    fn test_upstream_url_checks() {
        let ok = UpstreamConfig {
            url: Some("http://127.0.0.1:3001".to_string()),
            ..UpstreamConfig::default()
        };
        assert!(ConfigValidator::validate_upstream(&ok).is_ok());

        let bad_scheme = UpstreamConfig {
            url: Some("ftp://files.example.com".to_string()),
            ..UpstreamConfig::default()
        };
        assert!(ConfigValidator::validate_upstream(&bad_scheme).is_err());

        let garbage = UpstreamConfig {
            url: Some("not a url".to_string()),
            timeout_secs: 0,
        };
        assert_eq!(
            ConfigValidator::validate_upstream(&garbage).unwrap_err().count(),
            2
        );
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        let server = ServerConfig {
            timeout_secs: 0,
            max_body_bytes: 0,
            ..ServerConfig::default()
        };
        assert_eq!(ConfigValidator::validate_server(&server).unwrap_err().count(), 2);
    }

    #[test]
    fn test_log_level_is_checked() {
        let logging = LoggingConfig {
            level: "salon_gate=loud".to_string(),
            json: false,
        };
        assert!(ConfigValidator::validate_logging(&logging).is_err());
    }
}
