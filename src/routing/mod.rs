//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound path (e.g. /patients/42)
//!     → router.rs (scan compiled routes)
//!     → matcher.rs (segment-aware prefix strip)
//!     → Return: (route, remainder "/42") or RouteError::NotFound
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Normalize prefixes
//!     → Reject reserved and overlapping prefixes
//!     → Freeze as immutable RouteTable
//! ```

pub mod matcher;
pub mod router;

pub use matcher::PrefixMatcher;
pub use router::{ResolvedRoute, Route, RouteTable};
