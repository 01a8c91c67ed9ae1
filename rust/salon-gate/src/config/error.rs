//! Configuration error types with actionable user messages.

use std::fmt::Write as _;

use thiserror::Error;

/// Configuration errors with detailed, actionable messages.
#[derive(Debug, Clone, Error)]
pub enum ConfigurationError {
    /// Invalid configuration value.
    #[error("Invalid configuration: {message}\n\nHow to fix: {fix_hint}")]
    Invalid {
        /// What is wrong.
        message: String,
        /// How to fix it.
        fix_hint: String,
    },
    /// Two settings that cannot be used together.
    #[error("Incompatible settings: {setting1} cannot be used with {setting2}\n\nReason: {reason}")]
    Incompatible {
        setting1: String,
        setting2: String,
        /// Why they're incompatible.
        reason: String,
    },
    /// A required configuration is missing.
    #[error("Missing required configuration: {setting}\n\nRequired for: {context}\nSet via: {env_var}")]
    MissingRequired {
        setting: String,
        /// What needs this setting.
        context: String,
        /// Environment variable to set.
        env_var: String,
    },
    /// Multiple errors occurred.
    #[error("{}", render_multiple(.0))]
    Multiple(Vec<ConfigurationError>),
}

fn render_multiple(errors: &[ConfigurationError]) -> String {
    let mut out = String::from("Multiple configuration errors:\n");
    for (i, err) in errors.iter().enumerate() {
        let _ = writeln!(out, "\n{}. {}", i + 1, err);
    }
    out
}

impl ConfigurationError {
    #[must_use]
    pub fn invalid(message: impl Into<String>, fix_hint: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
            fix_hint: fix_hint.into(),
        }
    }

    #[must_use]
    pub fn incompatible(
        setting1: impl Into<String>,
        setting2: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Incompatible {
            setting1: setting1.into(),
            setting2: setting2.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn missing_required(
        setting: impl Into<String>,
        context: impl Into<String>,
        env_var: impl Into<String>,
    ) -> Self {
        Self::MissingRequired {
            setting: setting.into(),
            context: context.into(),
            env_var: env_var.into(),
        }
    }

    /// Collapse a list of errors: `Ok` when empty, the error itself when
    /// there is one, [`Self::Multiple`] otherwise. Nested lists are flattened.
    pub fn collect(errors: Vec<ConfigurationError>) -> ConfigResult<()> {
        let mut flat: Vec<ConfigurationError> = Vec::with_capacity(errors.len());
        for err in errors {
            match err {
                Self::Multiple(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        match flat.len() {
            0 => Ok(()),
            1 => Err(flat.remove(0)),
            _ => Err(Self::Multiple(flat)),
        }
    }

    /// Get the number of errors (1 for single errors, N for multiple).
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::Multiple(errors) => errors.len(),
            _ => 1,
        }
    }
}

/// Result type for configuration validation.
pub type ConfigResult<T> = Result<T, ConfigurationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_error_display() {
        let err = ConfigurationError::invalid(
            "gate.sign_in_path 'login' is not an absolute path",
            "Set SALON_GATE__GATE__SIGN_IN_PATH to a path starting with '/'",
        );
        let msg = err.to_string();
        assert!(msg.contains("Invalid configuration"));
        assert!(msg.contains("gate.sign_in_path"));
        assert!(msg.contains("How to fix"));
    }

    #[test]
    fn test_incompatible_error_display() {
        let err = ConfigurationError::incompatible(
            "gate.sign_in_path=/login",
            "gate.public_prefixes",
            "The sign-in page is protected, so every redirect would loop",
        );
        let msg = err.to_string();
        assert!(msg.contains("Incompatible"));
        assert!(msg.contains("/login"));
        assert!(msg.contains("loop"));
    }

    #[test]
    fn test_missing_required_error_display() {
        let err = ConfigurationError::missing_required(
            "gate.session_cookie",
            "Detecting signed-in users",
            "SESSION_COOKIE_NAME",
        );
        let msg = err.to_string();
        assert!(msg.contains("Missing required"));
        assert!(msg.contains("SESSION_COOKIE_NAME"));
    }

    #[test]
    fn test_multiple_errors_display() {
        let err = ConfigurationError::collect(vec![
            ConfigurationError::invalid("Error 1", "Fix 1"),
            ConfigurationError::invalid("Error 2", "Fix 2"),
        ])
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Multiple configuration errors"));
        assert!(msg.contains("1."));
        assert!(msg.contains("2."));
        assert_eq!(err.count(), 2);
    }

    #[test]
    fn test_collect_flattens_and_unwraps() {
        assert!(ConfigurationError::collect(Vec::new()).is_ok());

        let single = ConfigurationError::collect(vec![ConfigurationError::invalid("a", "b")])
            .unwrap_err();
        assert!(matches!(single, ConfigurationError::Invalid { .. }));

        let nested = ConfigurationError::collect(vec![
            ConfigurationError::Multiple(vec![
                ConfigurationError::invalid("a", "b"),
                ConfigurationError::invalid("c", "d"),
            ]),
            ConfigurationError::invalid("e", "f"),
        ])
        .unwrap_err();
        assert_eq!(nested.count(), 3);
    }
}
