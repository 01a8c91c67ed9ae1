//! Axum middleware that runs the [`RequestGate`] in front of every route.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use super::policy::{Admission, InboundRequest, RequestGate};

/// Admission middleware.
///
/// Install once with `axum::middleware::from_fn_with_state(gate, gate_middleware)`.
/// Unauthenticated requests for protected paths get `307 Temporary Redirect`
/// to the sign-in page with the resume parameter set. Paths that the upstream
/// would normalize to something else get `400 Bad Request`.
pub async fn gate_middleware(
    State(gate): State<Arc<RequestGate>>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    let admission = {
        let uri = req.uri();
        gate.admit(&InboundRequest::new(
            uri.path(),
            uri.query().unwrap_or_default(),
            &jar,
        ))
    };

    match admission {
        Admission::Allow(reason) => {
            tracing::debug!(path = %req.uri().path(), reason = ?reason, "Request admitted");
            next.run(req).await
        }
        Admission::RedirectToSignIn(directive) => {
            tracing::info!(
                path = %req.uri().path(),
                target = %directive.target,
                "No session cookie, redirecting to sign-in"
            );
            Redirect::temporary(&directive.location()).into_response()
        }
        Admission::Rejected(rejection) => {
            tracing::warn!(path = %req.uri().path(), reason = %rejection, "Request path rejected");
            rejection.into_response()
        }
    }
}
