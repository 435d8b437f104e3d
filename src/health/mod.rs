//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health
//!     → aggregator.rs (probe GET {backend}/ on every route, concurrently)
//!     → join on all probes, each bounded by the probe timeout
//!     → report.rs (healthy | unhealthy | down per service)
//! ```
//!
//! # Design Decisions
//! - Report rebuilt on every call; nothing is cached between calls
//! - One slow or dead backend never affects another's entry
//! - Aggregation never fails; a fully-down fleet still yields a full report

pub mod aggregator;
pub mod report;

pub use aggregator::HealthAggregator;
pub use report::{HealthReport, HealthStatus, ServiceHealth};
