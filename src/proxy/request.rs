//! Outbound request construction.

use axum::body::Bytes;
use axum::http::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderName};
use axum::http::Method;

use crate::auth::IdentityClaim;
use crate::config::ForwardingConfig;
use crate::proxy::headers::HeaderList;

/// Methods whose body is forwarded; every other method is sent bodiless.
pub fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Header names used to pass the verified identity downstream.
#[derive(Debug, Clone)]
pub struct IdentityHeaders {
    subject: HeaderName,
    role: HeaderName,
}

impl IdentityHeaders {
    /// Build the policy, or `None` when identity forwarding is disabled.
    pub fn from_config(config: &ForwardingConfig) -> Result<Option<Self>, InvalidHeaderName> {
        if !config.identity_headers {
            return Ok(None);
        }
        Ok(Some(Self {
            subject: HeaderName::try_from(config.subject_header.as_str())?,
            role: HeaderName::try_from(config.role_header.as_str())?,
        }))
    }

    /// Replace any client-supplied identity headers with the verified claim.
    fn apply(&self, headers: &mut HeaderList, identity: Option<&IdentityClaim>) {
        headers.remove(self.subject.as_str());
        headers.remove(self.role.as_str());

        let Some(identity) = identity else {
            return;
        };
        match (
            HeaderValue::from_str(&identity.subject_id),
            HeaderValue::from_str(&identity.role),
        ) {
            (Ok(subject), Ok(role)) => {
                headers.insert(self.subject.clone(), subject);
                headers.insert(self.role.clone(), role);
            }
            _ => tracing::warn!(
                subject = %identity.subject_id,
                "Identity not representable as header values; not forwarded"
            ),
        }
    }
}

/// A request ready to be sent to a backend. Immutable once built.
#[derive(Debug, Clone)]
pub struct ForwardedRequest {
    method: Method,
    target_url: String,
    headers: HeaderList,
    query: Option<String>,
    body: Option<Bytes>,
}

impl ForwardedRequest {
    /// Build from the inbound request parts.
    ///
    /// Hop-by-hop headers are stripped. The body is dropped unless the
    /// method carries one.
    pub fn new(
        method: Method,
        target_url: impl Into<String>,
        headers: &HeaderMap,
        query: Option<&str>,
        body: Option<Bytes>,
    ) -> Self {
        let mut headers = HeaderList::from(headers);
        headers.strip_hop_by_hop();

        let body = if carries_body(&method) { body } else { None };

        Self {
            method,
            target_url: target_url.into(),
            headers,
            query: query.filter(|q| !q.is_empty()).map(str::to_string),
            body,
        }
    }

    /// Apply the identity header policy.
    pub fn with_identity_headers(
        mut self,
        policy: &IdentityHeaders,
        identity: Option<&IdentityClaim>,
    ) -> Self {
        policy.apply(&mut self.headers, identity);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Full outbound URI, query string included.
    pub fn uri(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.target_url, query),
            None => self.target_url.clone(),
        }
    }

    pub(crate) fn into_parts(self) -> (Method, String, HeaderList, Option<Bytes>) {
        let uri = self.uri();
        (self.method, uri, self.headers, self.body)
    }
}
