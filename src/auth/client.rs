//! Authentication authority client.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

use crate::auth::identity::IdentityClaim;
use crate::config::AuthorityConfig;
use crate::error::AuthError;

/// Turns opaque bearer tokens into identity claims by asking the authority.
#[derive(Debug, Clone)]
pub struct AuthorityClient {
    client: reqwest::Client,
    verify_url: String,
}

impl AuthorityClient {
    /// Build a client for the configured authority.
    pub fn new(config: &AuthorityConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let verify_url = format!(
            "{}/{}",
            config.url.trim_end_matches('/'),
            config.verify_path.trim_start_matches('/')
        );

        Ok(Self { client, verify_url })
    }

    /// Full URL of the verification endpoint.
    pub fn verify_url(&self) -> &str {
        &self.verify_url
    }

    /// Verify a bearer token (scheme prefix already stripped).
    pub async fn verify(&self, bearer_token: Option<&str>) -> Result<IdentityClaim, AuthError> {
        let token = bearer_token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingCredential)?;

        let response = self
            .client
            .post(&self.verify_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %self.verify_url, error = %e, "Authority unreachable");
                AuthError::AuthorityUnavailable(e.to_string())
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!(status = %status, "Authority rejected token");
            return Err(AuthError::Rejected(format!("authority returned {}", status)));
        }

        let raw: Value = response.json().await.map_err(|e| {
            if e.is_decode() {
                AuthError::Rejected(format!("malformed identity claim: {}", e))
            } else {
                AuthError::AuthorityUnavailable(e.to_string())
            }
        })?;

        IdentityClaim::from_value(raw).map_err(AuthError::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str, path: &str) -> AuthorityConfig {
        AuthorityConfig {
            url: url.to_string(),
            verify_path: path.to_string(),
            ..AuthorityConfig::default()
        }
    }

    #[test]
    fn test_verify_url_joining() {
        let client = AuthorityClient::new(&config("http://auth:8001/", "/verify-token")).unwrap();
        assert_eq!(client.verify_url(), "http://auth:8001/verify-token");

        let client = AuthorityClient::new(&config("http://auth/api", "verify")).unwrap();
        assert_eq!(client.verify_url(), "http://auth/api/verify");
    }

    #[tokio::test]
    async fn test_missing_token_makes_no_call() {
        // Port 9 (discard) is never contacted: the check happens before any I/O.
        let client = AuthorityClient::new(&config("http://127.0.0.1:9", "/verify-token")).unwrap();

        assert_eq!(client.verify(None).await, Err(AuthError::MissingCredential));
        assert_eq!(client.verify(Some("   ")).await, Err(AuthError::MissingCredential));
    }
}
