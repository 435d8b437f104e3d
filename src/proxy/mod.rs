//! Request forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request parts + resolved route
//!     → request.rs (ForwardedRequest: strip hop-by-hop headers, drop body for bodiless methods)
//!     → forwarder.rs (pooled hyper client, deadline, buffer response)
//!     → ForwardedResponse (status, headers, bytes) relayed verbatim
//! ```

pub mod forwarder;
pub mod headers;
pub mod request;

pub use forwarder::{ForwardedResponse, Forwarder};
pub use headers::HeaderList;
pub use request::{ForwardedRequest, IdentityHeaders};
