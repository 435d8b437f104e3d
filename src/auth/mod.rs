//! Delegated authentication.
//!
//! # Data Flow
//! ```text
//! Authorization: Bearer <token>
//!     → http::request::bearer_token (scheme stripped by the dispatcher)
//!     → client.rs (POST {authority}/verify-token)
//!     → identity.rs (decode 200 body into IdentityClaim)
//!     → IdentityClaim or AuthError
//! ```
//!
//! # Design Decisions
//! - One verification call per protected request; no token cache, so
//!   revoked tokens are refused immediately
//! - No retries: a single failed call fails the inbound request
//! - Fail closed: an unreachable authority never yields an identity

pub mod client;
pub mod identity;

pub use client::AuthorityClient;
pub use identity::IdentityClaim;
