//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, or built-in defaults)
//!     → loader.rs (environment overrides: *_SERVICE_URL, GATEWAY_*)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no runtime reload
//! - All fields have defaults so the gateway runs with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{
    AuthorityConfig, CorsConfig, ForwardingConfig, GatewayConfig, HealthCheckConfig, ListenerConfig,
    LogFormat, ObservabilityConfig, RouteConfig, TimeoutConfig,
};
