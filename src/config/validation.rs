//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate URLs and value ranges (timeouts > 0, bind address parses)
//! - Check the inbound timeout outlasts the outbound ones
//! - Detect duplicate services and overlapping route prefixes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::error::RouteError;
use crate::routing::RouteTable;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no routes configured")]
    NoRoutes,

    #[error("duplicate route name {0:?}")]
    DuplicateRoute(String),

    #[error("{0}")]
    Route(RouteError),

    #[error("{field}: invalid URL {url:?}: {reason}")]
    InvalidUrl {
        field: String,
        url: String,
        reason: String,
    },

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("invalid bind address {0:?}")]
    InvalidBindAddress(String),

    #[error("{field}: invalid header name {value:?}")]
    InvalidHeaderName { field: &'static str, value: String },

    #[error("timeouts.request_secs ({request_secs}) must exceed every outbound wait ({bound}s)")]
    RequestTimeoutTooShort { request_secs: u64, bound: u64 },

    #[error("cors.allowed_origins: invalid origin {0:?}")]
    InvalidOrigin(String),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    check_url("authority.url", &config.authority.url, &mut errors);

    if config.routes.is_empty() {
        errors.push(ValidationError::NoRoutes);
    }

    let mut names = HashSet::new();
    for route in &config.routes {
        if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.name.clone()));
        }
        check_url(&format!("routes.{}.url", route.name), &route.url, &mut errors);
    }

    if let Err(e) = RouteTable::new(&config.routes) {
        errors.push(ValidationError::Route(e));
    }

    let positive = [
        ("authority.timeout_secs", config.authority.timeout_secs),
        ("health_check.timeout_secs", config.health_check.timeout_secs),
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.forward_secs", config.timeouts.forward_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("forwarding.max_body_bytes", config.forwarding.max_body_bytes as u64),
        (
            "forwarding.max_response_bytes",
            config.forwarding.max_response_bytes as u64,
        ),
    ];
    errors.extend(
        positive
            .iter()
            .filter(|(_, value)| *value == 0)
            .map(|(field, _)| ValidationError::ZeroValue(*field)),
    );

    // The inbound deadline must outlast every outbound wait.
    let bound = config
        .authority
        .timeout_secs
        .saturating_add(config.timeouts.forward_secs)
        .max(config.health_check.timeout_secs);
    if config.timeouts.request_secs <= bound {
        errors.push(ValidationError::RequestTimeoutTooShort {
            request_secs: config.timeouts.request_secs,
            bound,
        });
    }

    if config.cors.enabled {
        errors.extend(
            config
                .cors
                .allowed_origins
                .iter()
                .filter(|origin| origin.as_str() != "*")
                .filter(|origin| !is_valid_origin(origin))
                .map(|origin| ValidationError::InvalidOrigin(origin.clone())),
        );
    }

    if config.forwarding.identity_headers {
        let headers = [
            ("forwarding.subject_header", &config.forwarding.subject_header),
            ("forwarding.role_header", &config.forwarding.role_header),
        ];
        for (field, value) in headers {
            if HeaderName::try_from(value.as_str()).is_err() {
                errors.push(ValidationError::InvalidHeaderName {
                    field,
                    value: value.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_origin(origin: &str) -> bool {
    HeaderValue::from_str(origin).is_ok()
        && Url::parse(origin)
            .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
            .unwrap_or(false)
}

fn check_url(field: &str, raw: &str, errors: &mut Vec<ValidationError>) {
    let invalid = |reason: String| ValidationError::InvalidUrl {
        field: field.to_string(),
        url: raw.to_string(),
        reason,
    };

    match Url::parse(raw) {
        Ok(url) if url.scheme() != "http" => {
            errors.push(invalid(format!("unsupported scheme {:?}", url.scheme())))
        }
        Ok(url) if url.host_str().is_none() => errors.push(invalid("missing host".to_string())),
        Ok(url) if url.query().is_some() || url.fragment().is_some() => {
            errors.push(invalid("base URL must not carry a query or fragment".to_string()))
        }
        Ok(_) => {}
        Err(e) => errors.push(invalid(e.to_string())),
    }
}
