//! Route lookup.
//!
//! # Design Decisions
//! - Immutable after construction (shared via `Arc`, no locks)
//! - O(n) prefix scan (acceptable for a handful of services)
//! - Overlapping prefixes are rejected at construction, never resolved at request time
//! - Explicit `RouteError::NotFound` rather than a silent default

use crate::config::RouteConfig;
use crate::error::RouteError;
use crate::routing::matcher::PrefixMatcher;

/// Prefixes owned by the gateway's own system routes.
const RESERVED_PREFIXES: &[&str] = &["/health"];

/// A compiled route to one backend service.
#[derive(Debug, Clone)]
pub struct Route {
    /// Service name.
    pub name: String,
    /// Backend base URL, without a trailing slash.
    pub backend_base_url: String,
    /// Whether a verified identity is required.
    pub requires_auth: bool,
    matcher: PrefixMatcher,
}

impl Route {
    /// Normalized path prefix (e.g. `/patients`).
    pub fn prefix(&self) -> &str {
        self.matcher.as_str()
    }
}

/// Result of a successful lookup.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRoute<'a> {
    pub route: &'a Route,
    /// Inbound path with the prefix stripped; always begins with `/`.
    pub remainder: &'a str,
}

impl ResolvedRoute<'_> {
    /// Backend URL the request should be sent to, without the query string.
    pub fn target_url(&self) -> String {
        format!("{}{}", self.route.backend_base_url, self.remainder)
    }
}

/// Static mapping from path prefix to backend.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Compile route configuration, failing fast on invalid or overlapping prefixes.
    pub fn new(configs: &[RouteConfig]) -> Result<Self, RouteError> {
        let mut routes: Vec<Route> = Vec::with_capacity(configs.len());

        for config in configs {
            let matcher = PrefixMatcher::new(config.effective_prefix())?;

            if let Some(reserved) = RESERVED_PREFIXES
                .iter()
                .find(|reserved| matcher.strip(reserved).is_some())
            {
                return Err(RouteError::InvalidPrefix {
                    prefix: matcher.as_str().to_string(),
                    reason: format!("{} is reserved by the gateway", reserved),
                });
            }

            if let Some(existing) = routes.iter().find(|r| r.matcher.conflicts_with(&matcher)) {
                return Err(RouteError::Conflict {
                    first: existing.prefix().to_string(),
                    second: matcher.as_str().to_string(),
                });
            }

            routes.push(Route {
                name: config.name.clone(),
                backend_base_url: config.url.trim_end_matches('/').to_string(),
                requires_auth: config.requires_auth,
                matcher,
            });
        }

        Ok(Self { routes })
    }

    /// Resolve an inbound path to its backend and remainder path.
    pub fn resolve<'a>(&'a self, path: &'a str) -> Result<ResolvedRoute<'a>, RouteError> {
        self.routes
            .iter()
            .filter_map(|route| {
                route
                    .matcher
                    .strip(path)
                    .map(|remainder| ResolvedRoute { route, remainder })
            })
            .max_by_key(|resolved| resolved.route.prefix().len())
            .ok_or(RouteError::NotFound)
    }

    /// All routes, in configuration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}
