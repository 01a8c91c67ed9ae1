//! Public route table.
//!
//! A path is public when it matches either a literal prefix or a route
//! template. Templates are slash-separated and use `*` for exactly one
//! non-empty path segment:
//!
//! | Template              | Matches                      | Does not match          |
//! |-----------------------|------------------------------|-------------------------|
//! | `/*/book`             | `/acme/book`                 | `/acme/book/extra`      |
//! | `/*/appointment/*`    | `/acme/appointment/ABC123`   | `/acme/appointment`     |
//!
//! Templates compile to anchored regular expressions once, when the table is
//! built. Request handling never allocates or recompiles.

use regex::Regex;
use thiserror::Error;

/// Result of classifying a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Servable without a session.
    Public,
    /// Requires a session cookie.
    Protected,
}

/// Errors raised while compiling the route table.
#[derive(Debug, Error)]
pub enum RouteTableError {
    #[error("route `{route}` must start with `/`")]
    NotAbsolute { route: String },

    #[error("route template `{template}` has an empty path segment")]
    EmptySegment { template: String },

    #[error("route template `{template}` mixes `*` with literal text in one segment")]
    PartialWildcard { template: String },

    #[error("route template `{template}` did not compile: {source}")]
    Regex {
        template: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone)]
enum RouteRule {
    /// Exact path, or the path followed by `/...`. The root only matches itself.
    Prefix(String),
    Template { template: String, regex: Regex },
}

impl RouteRule {
    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Prefix(prefix) if prefix == "/" => path == "/",
            Self::Prefix(prefix) => path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
            Self::Template { regex, .. } => regex.is_match(path),
        }
    }
}

/// Ordered set of public-route rules. First match wins.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    /// Build a table from literal prefixes and route templates.
    pub fn new<P, T>(prefixes: P, templates: T) -> Result<Self, RouteTableError>
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        let mut rules = Vec::new();

        for prefix in prefixes {
            let prefix = prefix.as_ref();
            if !prefix.starts_with('/') {
                return Err(RouteTableError::NotAbsolute {
                    route: prefix.to_string(),
                });
            }
            // "/api/auth/" and "/api/auth" mean the same thing.
            let trimmed = prefix.trim_end_matches('/');
            let normalized = if trimmed.is_empty() { "/" } else { trimmed };
            rules.push(RouteRule::Prefix(normalized.to_string()));
        }

        for template in templates {
            let template = template.as_ref();
            rules.push(RouteRule::Template {
                template: template.to_string(),
                regex: compile_template(template)?,
            });
        }

        Ok(Self { rules })
    }

    /// Classify a request path. Paths not starting with `/` are protected.
    pub fn classify(&self, path: &str) -> Visibility {
        if path.starts_with('/') && self.rules.iter().any(|rule| rule.matches(path)) {
            Visibility::Public
        } else {
            Visibility::Protected
        }
    }

    /// Number of rules in the table.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table has no rules (everything is protected).
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Source text of each rule, in evaluation order.
    pub fn describe(&self) -> Vec<&str> {
        self.rules
            .iter()
            .map(|rule| match rule {
                RouteRule::Prefix(prefix) => prefix.as_str(),
                RouteRule::Template { template, .. } => template.as_str(),
            })
            .collect()
    }
}

/// Compile a route template such as `/*/appointment/*` into an anchored regex.
pub fn compile_template(template: &str) -> Result<Regex, RouteTableError> {
    let Some(rest) = template.strip_prefix('/') else {
        return Err(RouteTableError::NotAbsolute {
            route: template.to_string(),
        });
    };

    let mut pattern = String::from("^");
    for segment in rest.split('/') {
        match segment {
            "" => {
                return Err(RouteTableError::EmptySegment {
                    template: template.to_string(),
                });
            }
            "*" => pattern.push_str("/[^/]+"),
            literal if literal.contains('*') => {
                return Err(RouteTableError::PartialWildcard {
                    template: template.to_string(),
                });
            }
            literal => {
                pattern.push('/');
                pattern.push_str(&regex::escape(literal));
            }
        }
    }
    pattern.push('$');

    Regex::new(&pattern).map_err(|source| RouteTableError::Regex {
        template: template.to_string(),
        source,
    })
}
