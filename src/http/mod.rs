//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware: request id, trace, CORS, timeout)
//!     → cors.rs (preflights answered before dispatch)
//!     → request.rs (request id, bearer token extraction)
//!     → dispatcher (server.rs):
//!         routing → auth (if protected) → proxy::Forwarder
//!     → response.rs (errors as JSON `detail`) or verbatim backend response
//!     → Send to client
//! ```

pub mod cors;
pub mod request;
pub mod response;
pub mod server;

pub use request::{bearer_token, request_id, X_REQUEST_ID};
pub use server::{AppState, GatewayServer};
