//! Request forwarding to backends.
//!
//! # Design Decisions
//! - Inbound bodies are small documents; they are buffered, not streamed
//! - A non-2xx backend status is a successful forward, never an error
//! - Connect, exchange and body read all run under one deadline
//! - Response bodies are opaque bytes; nothing assumes JSON

use std::error::Error as StdError;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;

use crate::config::TimeoutConfig;
use crate::error::ForwardError;
use crate::proxy::headers::HeaderList;
use crate::proxy::request::ForwardedRequest;

/// A backend response, buffered for relay.
#[derive(Debug, Clone)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    /// Backend headers minus hop-by-hop headers.
    pub headers: HeaderList,
    pub body: Bytes,
}

impl IntoResponse for ForwardedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers.to_header_map();
        response
    }
}

/// Sends `ForwardedRequest`s over a pooled HTTP client.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
    max_response_bytes: usize,
}

impl Forwarder {
    pub fn new(timeouts: &TimeoutConfig, max_response_bytes: usize) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            timeout: Duration::from_secs(timeouts.forward_secs),
            max_response_bytes,
        }
    }

    /// Send the request and buffer the backend's response.
    pub async fn forward(&self, request: ForwardedRequest) -> Result<ForwardedResponse, ForwardError> {
        let (method, uri, headers, body) = request.into_parts();

        let mut builder = Request::builder().method(method.clone()).uri(uri.as_str());
        if let Some(outbound) = builder.headers_mut() {
            *outbound = headers.to_header_map();
        }
        let outbound = builder
            .body(body.map(Body::from).unwrap_or_else(Body::empty))
            .map_err(|e| ForwardError::InvalidTarget {
                target: uri.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(method = %method, target = %uri, "Forwarding request");

        let unavailable = |reason: String| ForwardError::BackendUnavailable {
            target: uri.clone(),
            reason,
        };

        let exchange = async {
            let response: Response<Incoming> = self
                .client
                .request(outbound)
                .await
                .map_err(|e| unavailable(describe(&e)))?;

            let (parts, incoming) = response.into_parts();
            let body = axum::body::to_bytes(Body::new(incoming), self.max_response_bytes)
                .await
                .map_err(|e| unavailable(format!("failed to read backend response: {}", describe(&e))))?;

            Ok::<_, ForwardError>((parts, body))
        };

        let (parts, body) = match time::timeout(self.timeout, exchange).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(unavailable(format!(
                    "backend did not respond within {}s",
                    self.timeout.as_secs()
                )))
            }
        };

        let mut headers = HeaderList::from(&parts.headers);
        headers.strip_hop_by_hop();

        Ok(ForwardedResponse {
            status: parts.status,
            headers,
            body,
        })
    }
}

/// Render an error with its whole source chain.
pub(crate) fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, Method};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_refused_connection_is_backend_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let forwarder = Forwarder::new(&TimeoutConfig::default(), 1024);
        let request = ForwardedRequest::new(
            Method::GET,
            format!("http://{}/42", addr),
            &HeaderMap::new(),
            None,
            None,
        );

        match forwarder.forward(request).await {
            Err(ForwardError::BackendUnavailable { target, reason }) => {
                assert_eq!(target, format!("http://{}/42", addr));
                assert!(!reason.is_empty());
            }
            other => panic!("expected BackendUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_response_relay_preserves_status_headers_body() {
        let mut headers = HeaderList::new();
        headers.append(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
        let response = ForwardedResponse {
            status: StatusCode::IM_A_TEAPOT,
            headers,
            body: Bytes::from_static(&[0, 159, 146, 150]),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(
            response.headers()["content-type"],
            HeaderValue::from_static("application/octet-stream")
        );
    }
}
