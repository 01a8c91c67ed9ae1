//! Request gate - admission control for every inbound request.
//!
//! Evaluation order for one request:
//!
//! 1. [`check_path`]: paths with `.`/`..` segments or backslashes get 400.
//! 2. [`ExemptionFilter`]: static assets and probes pass straight through.
//! 3. [`RouteTable`]: public routes pass.
//! 4. [`SessionCookie`]: protected routes pass when the session cookie is set.
//! 5. Otherwise the request is redirected to sign-in with a [`RedirectDirective`]
//!    carrying the original path and query.
//!
//! All of it lives in one [`RequestGate`] built from one
//! [`GateConfig`](crate::config::GateConfig), installed at one interception
//! point ([`gate_middleware`]).

pub mod exempt;
pub mod middleware;
pub mod path;
pub mod policy;
pub mod resume;
pub mod rules;
pub mod session;

pub use exempt::ExemptionFilter;
pub use middleware::gate_middleware;
pub use path::{check_path, PathRejection};
pub use policy::{Admission, AllowReason, InboundRequest, RequestGate};
pub use resume::{RedirectDirective, ResumeError, ResumeTarget, DEFAULT_RESUME_PARAM};
pub use rules::{RouteTable, RouteTableError, Visibility};
pub use session::SessionCookie;
