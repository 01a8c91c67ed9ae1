//! Resume parameter: carries the originally requested path through sign-in.
//!
//! The gate writes it ([`RedirectDirective`]); the sign-in page reads it back
//! ([`ResumeTarget::from_query`]). Both sides take the parameter name from
//! the same [`GateConfig`](crate::config::GateConfig), so they cannot drift.

use thiserror::Error;
use url::form_urlencoded;

/// Default name of the resume query parameter.
pub const DEFAULT_RESUME_PARAM: &str = "redirect";

/// Where an unauthenticated request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectDirective {
    /// Sign-in page path, e.g. `/sign-in`.
    pub target: String,
    /// Name of the resume query parameter.
    pub resume_param: String,
    /// Original path plus `?query` when the query was non-empty. Not encoded.
    pub resume: String,
}

impl RedirectDirective {
    pub fn new(
        target: impl Into<String>,
        resume_param: impl Into<String>,
        path: &str,
        query: &str,
    ) -> Self {
        Self {
            target: target.into(),
            resume_param: resume_param.into(),
            resume: resume_value(path, query),
        }
    }

    /// Value for the `Location` header: `/sign-in?redirect=<encoded>`.
    pub fn location(&self) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair(&self.resume_param, &self.resume)
            .finish();
        format!("{}?{query}", self.target)
    }
}

/// Join a path and a raw query string the way the browser showed them.
pub fn resume_value(path: &str, query: &str) -> String {
    let query = query.strip_prefix('?').unwrap_or(query);
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

/// Why a resume value was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResumeError {
    #[error("resume target is empty")]
    Empty,

    #[error("resume target must be a path starting with `/`")]
    NotRelative,

    #[error("resume target `//...` would leave the site")]
    ProtocolRelative,

    #[error("resume target contains a backslash")]
    Backslash,

    #[error("resume target contains control characters")]
    ControlCharacter,
}

/// A same-origin relative path that is safe to navigate to after sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeTarget(String);

impl ResumeTarget {
    /// Validate a decoded resume value.
    pub fn parse(raw: &str) -> Result<Self, ResumeError> {
        if raw.is_empty() {
            return Err(ResumeError::Empty);
        }
        if !raw.starts_with('/') {
            return Err(ResumeError::NotRelative);
        }
        if raw.starts_with("//") {
            return Err(ResumeError::ProtocolRelative);
        }
        // Browsers treat `\` as `/`, so `/\evil.com` is protocol-relative too.
        if raw.contains('\\') {
            return Err(ResumeError::Backslash);
        }
        if raw.chars().any(char::is_control) {
            return Err(ResumeError::ControlCharacter);
        }
        Ok(Self(raw.to_string()))
    }

    /// Read the resume parameter from a sign-in page query string.
    ///
    /// Missing or unsafe values fall back to `/`.
    pub fn from_query(query: &str, resume_param: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let raw = form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == resume_param)
            .map(|(_, value)| value.into_owned());

        match raw.as_deref().map(Self::parse) {
            Some(Ok(target)) => target,
            Some(Err(e)) => {
                tracing::debug!(error = %e, "Ignoring unsafe resume target");
                Self::root()
            }
            None => Self::root(),
        }
    }

    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResumeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_resume(location: &str, param: &str) -> String {
        let (_, query) = location.split_once('?').unwrap();
        form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == param)
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[test]
    fn test_location_without_query() {
        let directive = RedirectDirective::new("/sign-in", "redirect", "/dashboard", "");
        assert_eq!(directive.location(), "/sign-in?redirect=%2Fdashboard");
    }

    #[test]
    fn test_query_is_preserved_verbatim() {
        let directive =
            RedirectDirective::new("/sign-in", "redirect", "/path", "foo=bar&baz=1");
        assert_eq!(directive.resume, "/path?foo=bar&baz=1");
        assert_eq!(
            decode_resume(&directive.location(), "redirect"),
            "/path?foo=bar&baz=1"
        );
    }

    #[test]
    fn test_awkward_characters_round_trip() {
        for (path, query) in [
            ("/acme/reports", "from=2026-01-01&to=2026-02-01"),
            ("/acme/products", "q=gel+polish&tag=a%20b"),
            ("/acme/services", "name=coupe femme&note=100%"),
            ("/café/settings", "tab=équipe"),
            ("/acme/ai-studio", "prompt=a=b&&c"),
        ] {
            let directive = RedirectDirective::new("/sign-in", "redirect", path, query);
            assert_eq!(
                decode_resume(&directive.location(), "redirect"),
                format!("{path}?{query}")
            );
        }
    }

    #[test]
    fn test_leading_question_mark_is_not_doubled() {
        assert_eq!(resume_value("/a", "?x=1"), "/a?x=1");
        assert_eq!(resume_value("/a", "?"), "/a");
    }

    #[test]
    fn test_safe_targets_are_accepted() {
        assert_eq!(
            ResumeTarget::parse("/dashboard?x=1").unwrap().as_str(),
            "/dashboard?x=1"
        );
        assert_eq!(ResumeTarget::parse("/").unwrap(), ResumeTarget::root());
    }

    #[test]
    fn test_open_redirects_are_rejected() {
        assert_eq!(ResumeTarget::parse(""), Err(ResumeError::Empty));
        assert_eq!(
            ResumeTarget::parse("https://evil.com"),
            Err(ResumeError::NotRelative)
        );
        assert_eq!(
            ResumeTarget::parse("//evil.com"),
            Err(ResumeError::ProtocolRelative)
        );
        assert_eq!(
            ResumeTarget::parse("/\\evil.com"),
            Err(ResumeError::Backslash)
        );
        assert_eq!(
            ResumeTarget::parse("/a\r\nSet-Cookie: x=1"),
            Err(ResumeError::ControlCharacter)
        );
    }

    #[test]
    fn test_from_query_reads_what_the_gate_wrote() {
        let directive =
            RedirectDirective::new("/sign-in", "redirect", "/acme/settings", "tab=staff");
        let location = directive.location();
        let (_, query) = location.split_once('?').unwrap();
        let target = ResumeTarget::from_query(query, "redirect");
        assert_eq!(target.as_str(), "/acme/settings?tab=staff");
    }

    #[test]
    fn test_from_query_falls_back_to_root() {
        assert_eq!(ResumeTarget::from_query("", "redirect"), ResumeTarget::root());
        assert_eq!(
            ResumeTarget::from_query("?redirect=%2F%2Fevil.com", "redirect"),
            ResumeTarget::root()
        );
        // A differently named parameter is not honoured.
        assert_eq!(
            ResumeTarget::from_query("callbackUrl=%2Fdashboard", "redirect"),
            ResumeTarget::root()
        );
    }
}
