//! The admission policy: exemptions, public routes, session check.

use axum_extra::extract::cookie::CookieJar;

use super::exempt::ExemptionFilter;
use super::path::{check_path, PathRejection};
use super::resume::RedirectDirective;
use super::rules::{RouteTable, RouteTableError, Visibility};
use super::session::SessionCookie;
use crate::config::GateConfig;

/// The parts of an inbound request the gate looks at.
#[derive(Debug, Clone, Copy)]
pub struct InboundRequest<'a> {
    /// URL path, starting with `/`.
    pub path: &'a str,
    /// Raw query string without the leading `?`. May be empty.
    pub query: &'a str,
    pub cookies: &'a CookieJar,
}

impl<'a> InboundRequest<'a> {
    pub fn new(path: &'a str, query: &'a str, cookies: &'a CookieJar) -> Self {
        Self {
            path,
            query,
            cookies,
        }
    }
}

/// Why a request was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    /// Static asset or probe; route lookup was skipped.
    Exempt,
    /// Path matched the public route table.
    PublicRoute,
    /// Protected path with a session cookie present.
    Session,
}

/// Gate decision for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Allow(AllowReason),
    RedirectToSignIn(RedirectDirective),
    /// Path would be resolved to a different route upstream; answer 400.
    Rejected(PathRejection),
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }
}

/// Single admission-control policy, evaluated once per request.
///
/// Built once from [`GateConfig`] and shared behind an `Arc`; holds no
/// mutable state.
#[derive(Debug, Clone)]
pub struct RequestGate {
    exemptions: ExemptionFilter,
    routes: RouteTable,
    session: SessionCookie,
    sign_in_path: String,
    resume_param: String,
}

impl RequestGate {
    /// Compile the gate from configuration.
    pub fn from_config(config: &GateConfig) -> Result<Self, RouteTableError> {
        let routes = RouteTable::new(&config.public_prefixes, &config.public_templates)?;
        let exemptions = ExemptionFilter::new(
            config.exempt_prefixes.iter().cloned(),
            config.exempt_paths.iter().cloned(),
            &config.exempt_extensions,
        );

        Ok(Self {
            exemptions,
            routes,
            session: SessionCookie::new(config.session_cookie.clone()),
            sign_in_path: config.sign_in_path.clone(),
            resume_param: config.resume_param.clone(),
        })
    }

    /// Classify a path as public or protected. Pure function of the path.
    pub fn classify(&self, path: &str) -> Visibility {
        self.routes.classify(path)
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.exemptions.is_exempt(path)
    }

    /// Decide whether a request continues or goes to sign-in.
    ///
    /// Paths with dot segments or backslashes are rejected before the
    /// exemption and route checks, so the path that is classified is the
    /// path that gets served.
    pub fn admit(&self, request: &InboundRequest<'_>) -> Admission {
        if let Err(rejection) = check_path(request.path) {
            return Admission::Rejected(rejection);
        }
        if self.is_exempt(request.path) {
            return Admission::Allow(AllowReason::Exempt);
        }

        match self.classify(request.path) {
            Visibility::Public => Admission::Allow(AllowReason::PublicRoute),
            Visibility::Protected if self.session.is_present(request.cookies) => {
                Admission::Allow(AllowReason::Session)
            }
            Visibility::Protected => Admission::RedirectToSignIn(RedirectDirective::new(
                self.sign_in_path.as_str(),
                self.resume_param.as_str(),
                request.path,
                request.query,
            )),
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn exemptions(&self) -> &ExemptionFilter {
        &self.exemptions
    }

    pub fn session_cookie(&self) -> &str {
        self.session.name()
    }

    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }

    pub fn resume_param(&self) -> &str {
        &self.resume_param
    }
}
