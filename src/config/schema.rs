//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so the gateway runs standalone with no file.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Authentication authority settings.
    pub authority: AuthorityConfig,

    /// Route definitions mapping path prefixes to backends.
    pub routes: Vec<RouteConfig>,

    /// Liveness probe settings.
    pub health_check: HealthCheckConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Forwarding policy.
    pub forwarding: ForwardingConfig,

    /// Cross-origin access for browser clients.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            authority: AuthorityConfig::default(),
            routes: default_routes(),
            health_check: HealthCheckConfig::default(),
            timeouts: TimeoutConfig::default(),
            forwarding: ForwardingConfig::default(),
            cors: CorsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Authentication authority configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthorityConfig {
    /// Base URL of the authority.
    pub url: String,

    /// Environment variable that overrides `url`.
    pub url_env: Option<String>,

    /// Path of the verification endpoint, appended to `url`.
    pub verify_path: String,

    /// Verification call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8001".to_string(),
            url_env: Some("AUTH_SERVICE_URL".to_string()),
            verify_path: "/verify-token".to_string(),
            timeout_secs: 10,
        }
    }
}

/// A single backend service reachable through the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Service name, used in the health report and service descriptor.
    pub name: String,

    /// Path prefix; defaults to the service name.
    #[serde(default)]
    pub prefix: Option<String>,

    /// Backend base URL (e.g., "http://localhost:8002").
    pub url: String,

    /// Environment variable that overrides `url`.
    #[serde(default)]
    pub url_env: Option<String>,

    /// Whether a verified identity is required before forwarding.
    #[serde(default = "default_requires_auth")]
    pub requires_auth: bool,
}

impl RouteConfig {
    /// Create a protected route whose prefix equals its name.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            url: url.into(),
            url_env: None,
            requires_auth: true,
        }
    }

    /// Mark the route as reachable without credentials.
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    /// Set the environment variable that overrides the URL.
    pub fn with_url_env(mut self, var: impl Into<String>) -> Self {
        self.url_env = Some(var.into());
        self
    }

    /// Effective prefix: the explicit prefix or, failing that, the name.
    pub fn effective_prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or(&self.name)
    }
}

fn default_requires_auth() -> bool {
    true
}

fn default_routes() -> Vec<RouteConfig> {
    vec![
        // Login and registration live behind this route; it cannot require a token.
        RouteConfig::new("auth", "http://localhost:8001")
            .with_url_env("AUTH_SERVICE_URL")
            .public(),
        RouteConfig::new("patients", "http://localhost:8002").with_url_env("PATIENT_SERVICE_URL"),
        RouteConfig::new("doctors", "http://localhost:8003").with_url_env("DOCTOR_SERVICE_URL"),
        RouteConfig::new("records", "http://localhost:8004").with_url_env("RECORDS_SERVICE_URL"),
    ]
}

/// Liveness probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Path to probe on every backend.
    pub path: String,

    /// Probe timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            timeout_secs: 5,
        }
    }
}

/// Timeout configuration for outbound and inbound work.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total time for one forwarded exchange, body included, in seconds.
    pub forward_secs: u64,

    /// Upper bound on handling one inbound request in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            forward_secs: 30,
            request_secs: 60,
        }
    }
}

/// Forwarding policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Attach the verified identity to outbound requests.
    pub identity_headers: bool,

    /// Header carrying the verified subject.
    pub subject_header: String,

    /// Header carrying the verified role.
    pub role_header: String,

    /// Maximum inbound body size in bytes.
    pub max_body_bytes: usize,

    /// Maximum backend response size in bytes.
    pub max_response_bytes: usize,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            identity_headers: false,
            subject_header: "x-authenticated-subject".to_string(),
            role_header: "x-authenticated-role".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
            max_response_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Cross-origin resource sharing policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Answer preflights and add `Access-Control-*` headers.
    pub enabled: bool,

    /// Allowed origins. `"*"` allows any origin; the request's origin is
    /// echoed back so credentials remain usable.
    pub allowed_origins: Vec<String>,

    /// Send `Access-Control-Allow-Credentials: true`.
    pub allow_credentials: bool,
}

impl CorsConfig {
    /// True if any origin is accepted.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allow_credentials: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_routes() {
        let config = GatewayConfig::default();
        let names: Vec<_> = config.routes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["auth", "patients", "doctors", "records"]);
        assert!(!config.routes[0].requires_auth);
        assert!(config.routes[1..].iter().all(|r| r.requires_auth));
        assert_eq!(config.routes[1].url_env.as_deref(), Some("PATIENT_SERVICE_URL"));
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [[routes]]
            name = "patients"
            url = "http://svc-a"

            [[routes]]
            name = "login"
            prefix = "auth"
            url = "http://svc-b"
            requires_auth = false
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.routes.len(), 2);
        assert!(config.routes[0].requires_auth);
        assert_eq!(config.routes[1].effective_prefix(), "auth");
        assert_eq!(config.authority.verify_path, "/verify-token");
        assert_eq!(config.health_check.timeout_secs, 5);
        assert!(config.cors.enabled);
        assert!(config.cors.allows_any_origin());
    }

    #[test]
    fn test_parse_cors_origins() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [cors]
            allowed_origins = ["http://localhost:3000"]
            allow_credentials = false
            "#,
        )
        .unwrap();

        assert!(config.cors.enabled);
        assert!(!config.cors.allows_any_origin());
        assert_eq!(config.cors.allowed_origins, vec!["http://localhost:3000"]);
        assert!(!config.cors.allow_credentials);
    }

    #[test]
    fn test_missing_routes_use_defaults() {
        let config: GatewayConfig = toml::from_str("[timeouts]\nforward_secs = 3\n").unwrap();
        assert_eq!(config.routes.len(), 4);
        assert_eq!(config.timeouts.forward_secs, 3);
        assert_eq!(config.timeouts.connect_secs, 5);
    }
}
