//! Error taxonomy for the gateway.
//!
//! Request-time errors (`RouteError`, `AuthError`, `ForwardError`) are all
//! recovered at the dispatcher boundary and rendered by `http::response`.
//! `StartupError` covers everything that can abort process start.

use axum::http::{Method, StatusCode};
use thiserror::Error;

use crate::config::loader::ConfigError;

/// Errors produced by the routing table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteError {
    /// No configured prefix matches the inbound path.
    #[error("Service not found")]
    NotFound,

    /// A configured prefix is empty, reserved, or malformed.
    #[error("invalid route prefix {prefix:?}: {reason}")]
    InvalidPrefix { prefix: String, reason: String },

    /// Two configured prefixes could match the same path.
    #[error("route prefixes {first:?} and {second:?} overlap")]
    Conflict { first: String, second: String },
}

/// Errors produced while verifying a bearer credential.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer token was presented.
    #[error("missing bearer credential")]
    MissingCredential,

    /// The authority answered but did not accept the token.
    #[error("token rejected: {0}")]
    Rejected(String),

    /// The authority could not be reached or did not answer in time.
    #[error("authentication authority unavailable: {0}")]
    AuthorityUnavailable(String),
}

impl AuthError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::Rejected(_) => "rejected",
            AuthError::AuthorityUnavailable(_) => "authority_unavailable",
        }
    }
}

/// Errors produced by the request forwarder.
///
/// A backend answering with a non-2xx status is *not* an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForwardError {
    /// Transport-level failure: refused, reset, DNS, or timeout.
    #[error("{reason}")]
    BackendUnavailable { target: String, reason: String },

    /// The outbound request could not be constructed.
    #[error("invalid forward target {target}: {reason}")]
    InvalidTarget { target: String, reason: String },
}

/// Umbrella error for a single inbound request.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Forward(#[from] ForwardError),

    #[error("method {0} not allowed")]
    MethodNotAllowed(Method),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    BodyRead(String),
}

impl GatewayError {
    /// HTTP status the caller receives for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Route(_) => StatusCode::NOT_FOUND,
            // Fail closed: an unreachable authority is indistinguishable from a rejection.
            GatewayError::Auth(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Forward(ForwardError::BackendUnavailable { .. }) => StatusCode::BAD_GATEWAY,
            GatewayError::Forward(ForwardError::InvalidTarget { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::BodyRead(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Human-readable `detail` string placed in the JSON error body.
    pub fn detail(&self) -> String {
        match self {
            GatewayError::Route(RouteError::NotFound) => "Service not found".to_string(),
            GatewayError::Route(e) => e.to_string(),
            GatewayError::Auth(AuthError::MissingCredential) => "Not authenticated".to_string(),
            GatewayError::Auth(AuthError::Rejected(_)) => "Invalid token".to_string(),
            GatewayError::Auth(AuthError::AuthorityUnavailable(_)) => {
                "Authentication service unavailable".to_string()
            }
            GatewayError::Forward(e) => e.to_string(),
            GatewayError::MethodNotAllowed(_) => "Method not allowed".to_string(),
            GatewayError::PayloadTooLarge { .. } | GatewayError::BodyRead(_) => self.to_string(),
        }
    }
}

/// Errors that abort gateway startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("routing table error: {0}")]
    Route(#[from] RouteError),

    #[error("failed to build authority client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid header name: {0}")]
    HeaderName(#[from] axum::http::header::InvalidHeaderName),

    #[error("metrics exporter error: {0}")]
    Metrics(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
