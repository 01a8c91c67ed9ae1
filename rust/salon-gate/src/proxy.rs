//! Upstream forwarding for admitted requests.
//!
//! [`Upstream`] relays a request to the web application behind the gate and
//! returns its response unchanged, apart from hop-by-hop headers. Redirects
//! from the upstream are passed to the browser, not followed.

use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        header::{self, HeaderMap, HeaderName},
        StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::AppState;

/// Headers that describe one connection and must not be forwarded.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Forwarding errors.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("no upstream is configured")]
    NotConfigured,

    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("upstream {base_url} unreachable: {source}")]
    Unreachable {
        base_url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request body rejected (limit {limit} bytes): {message}")]
    BodyRejected { limit: usize, message: String },
}

/// JSON error body, same shape as the other gateway errors.
#[derive(Debug, Serialize)]
struct ProxyErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            Self::NotConfigured => (StatusCode::BAD_GATEWAY, "no_upstream"),
            Self::Client(_) => (StatusCode::INTERNAL_SERVER_ERROR, "client_error"),
            Self::Unreachable { .. } => (StatusCode::BAD_GATEWAY, "upstream_unreachable"),
            Self::BodyRejected { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "body_rejected"),
        };

        let body = ProxyErrorBody {
            error,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// The web application behind the gate.
#[derive(Debug, Clone)]
pub struct Upstream {
    base_url: String,
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl Upstream {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        max_body_bytes: usize,
    ) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(ProxyError::Client)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            max_body_bytes,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Forward `req` to `{base_url}{path}?{query}` and relay the response.
    pub async fn forward(&self, req: Request) -> Result<Response, ProxyError> {
        let (parts, body) = req.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map_or("/", axum::http::uri::PathAndQuery::as_str);
        let url = format!("{}{}", self.base_url, path_and_query);

        let body = axum::body::to_bytes(body, self.max_body_bytes)
            .await
            .map_err(|e| ProxyError::BodyRejected {
                limit: self.max_body_bytes,
                message: e.to_string(),
            })?;

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);
        headers.remove(header::CONTENT_LENGTH);

        tracing::debug!(method = %parts.method, url = %url, "Forwarding to upstream");

        let upstream_resp = self
            .client
            .request(parts.method, &url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|source| ProxyError::Unreachable {
                base_url: self.base_url.clone(),
                source,
            })?;

        let status = upstream_resp.status();
        let mut resp_headers = upstream_resp.headers().clone();
        strip_hop_by_hop(&mut resp_headers);
        resp_headers.remove(header::CONTENT_LENGTH);

        let bytes = upstream_resp
            .bytes()
            .await
            .map_err(|source| ProxyError::Unreachable {
                base_url: self.base_url.clone(),
                source,
            })?;

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = resp_headers;
        Ok(response)
    }
}

/// Remove hop-by-hop headers, including any named in `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in &named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Fallback handler: forward everything the router does not serve itself.
pub async fn forward_handler(
    State(state): State<AppState>,
    req: Request,
) -> Result<Response, ProxyError> {
    let upstream = state.upstream.as_ref().ok_or(ProxyError::NotConfigured)?;
    upstream.forward(req).await
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-trace"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-trace", HeaderValue::from_static("1"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::COOKIE, HeaderValue::from_static("a=b"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::COOKIE));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let upstream =
            Upstream::new("http://127.0.0.1:3001/", Duration::from_secs(5), 1024).unwrap();
        assert_eq!(upstream.base_url(), "http://127.0.0.1:3001");
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(
            ProxyError::NotConfigured.into_response().status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ProxyError::BodyRejected {
                limit: 1,
                message: "length limit exceeded".to_string()
            }
            .into_response()
            .status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
