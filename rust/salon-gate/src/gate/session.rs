//! Session cookie presence check.

use axum_extra::extract::cookie::CookieJar;

/// The reserved cookie that marks an active session.
///
/// Only presence is checked. The session issuer validates the value later in
/// the request lifecycle.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
}

impl SessionCookie {
    /// Check for the cookie called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Cookie name, e.g. `better-auth.session_token`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when the jar holds this cookie with a non-empty value.
    pub fn is_present(&self, jar: &CookieJar) -> bool {
        jar.get(&self.name)
            .is_some_and(|cookie| !cookie.value().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{header::COOKIE, HeaderMap, HeaderValue};

    use super::*;

    fn jar(cookie_header: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie_header).unwrap());
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn test_present_cookie() {
        let session = SessionCookie::new("better-auth.session_token");
        assert!(session.is_present(&jar("theme=dark; better-auth.session_token=abc.def")));
    }

    #[test]
    fn test_empty_value_is_absent() {
        let session = SessionCookie::new("better-auth.session_token");
        assert!(!session.is_present(&jar("better-auth.session_token=")));
    }

    #[test]
    fn test_other_cookies_do_not_count() {
        let session = SessionCookie::new("better-auth.session_token");
        assert!(!session.is_present(&jar("session_token=abc; theme=dark")));
        assert!(!session.is_present(&CookieJar::new()));
    }
}
