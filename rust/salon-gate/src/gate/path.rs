//! Request path screening, run before any route lookup.
//!
//! The upstream client resolves `.` and `..` segments (including the
//! `%2e`-encoded forms) and treats `\` as `/`. A path carrying any of those
//! would be classified as one route and served as another, so such paths are
//! refused outright.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Why a request path was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathRejection {
    #[error("request path contains a `.` or `..` segment")]
    DotSegment,

    #[error("request path contains a backslash")]
    Backslash,
}

#[derive(Debug, Serialize)]
struct PathRejectionBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for PathRejection {
    fn into_response(self) -> Response {
        let body = PathRejectionBody {
            error: "invalid_path",
            message: self.to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// Accept `path` only if it names the same resource before and after URL
/// normalization.
pub fn check_path(path: &str) -> Result<(), PathRejection> {
    let lowered = path.to_ascii_lowercase();
    if lowered.contains('\\') || lowered.contains("%5c") {
        return Err(PathRejection::Backslash);
    }
    if lowered.split('/').any(is_dot_segment) {
        return Err(PathRejection::DotSegment);
    }
    Ok(())
}

/// `.`, `..` and their percent-encoded spellings (`%2e`, `.%2e`, `%2e%2e`, ...).
fn is_dot_segment(segment: &str) -> bool {
    matches!(segment.replace("%2e", ".").as_str(), "." | "..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paths_pass() {
        for path in [
            "/",
            "/dashboard",
            "/acme/book",
            "/_next/static/chunk.abc.js",
            "/acme/logo.png",
            "/notes/...",
            "/.well-known/security.txt",
        ] {
            assert_eq!(check_path(path), Ok(()), "{path}");
        }
    }

    #[test]
    fn test_dot_segments_are_rejected() {
        for path in [
            "/sign-in/../dashboard",
            "/sign-in/..",
            "/./dashboard",
            "/api/auth/%2e%2e/%2e%2e/dashboard",
            "/api/auth/%2E%2E/dashboard",
            "/api/auth/.%2e/dashboard",
            "/api/auth/%2e./dashboard",
            "/_next/static/../../acme/settings",
        ] {
            assert_eq!(check_path(path), Err(PathRejection::DotSegment), "{path}");
        }
    }

    #[test]
    fn test_backslashes_are_rejected() {
        assert_eq!(
            check_path("/sign-in/..\\dashboard"),
            Err(PathRejection::Backslash)
        );
        assert_eq!(
            check_path("/sign-in/..%5Cdashboard"),
            Err(PathRejection::Backslash)
        );
    }

    #[test]
    fn test_rejection_is_bad_request() {
        let resp = PathRejection::DotSegment.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
