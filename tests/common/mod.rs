//! Shared utilities for integration testing.
//!
//! Every server binds `127.0.0.1:0`, so tests run in parallel without port
//! collisions.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use clinic_gateway::config::{GatewayConfig, RouteConfig};
use clinic_gateway::{GatewayServer, Shutdown};
use serde_json::json;
use tokio::net::TcpListener;

/// A request as observed by a mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Shared log of the requests a mock server received.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> RecordedRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request recorded")
    }

    fn push(&self, request: RecordedRequest) {
        self.requests.lock().unwrap().push(request);
    }
}

pub type Responder = Arc<dyn Fn(&RecordedRequest) -> Response + Send + Sync>;

/// Serve `app` on an ephemeral port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start a mock backend that records every request and answers with `respond`.
pub async fn spawn_backend<F>(recorder: Recorder, respond: F) -> SocketAddr
where
    F: Fn(&RecordedRequest) -> Response + Send + Sync + 'static,
{
    let respond: Responder = Arc::new(respond);
    let app = Router::new().fallback(move |request: Request<Body>| {
        let recorder = recorder.clone();
        let respond = respond.clone();
        async move {
            let (parts, body) = request.into_parts();
            let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
            let recorded = RecordedRequest {
                method: parts.method,
                path: parts.uri.path().to_string(),
                query: parts.uri.query().map(str::to_string),
                headers: parts.headers,
                body,
            };
            let response = respond(&recorded);
            recorder.push(recorded);
            response
        }
    });
    serve(app).await
}

/// Start a backend that answers `200 {"ok": true}` to everything.
pub async fn spawn_ok_backend(recorder: Recorder) -> SocketAddr {
    spawn_backend(recorder, |_| Json(json!({"ok": true})).into_response()).await
}

/// Start a mock authority. The token `good` verifies as subject `u1`, role
/// `admin`; anything else is rejected with 401.
pub async fn spawn_authority(recorder: Recorder) -> SocketAddr {
    let app = Router::new().route(
        "/verify-token",
        post(move |headers: HeaderMap| {
            let recorder = recorder.clone();
            async move {
                let authorization = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                recorder.push(RecordedRequest {
                    method: Method::POST,
                    path: "/verify-token".to_string(),
                    query: None,
                    headers,
                    body: Bytes::new(),
                });

                match authorization.as_deref() {
                    Some("Bearer good") => {
                        (StatusCode::OK, Json(json!({"subject": "u1", "role": "admin"})))
                            .into_response()
                    }
                    _ => (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({"detail": "Could not validate credentials"})),
                    )
                        .into_response(),
                }
            }
        }),
    );
    serve(app).await
}

/// Start a server that accepts connections but never answers.
pub async fn spawn_stalled() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Gateway configuration pointing at the given authority, with no routes.
pub fn test_config(authority: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.authority.url = format!("http://{}", authority);
    config.authority.url_env = None;
    config.authority.timeout_secs = 2;
    config.health_check.timeout_secs = 2;
    config.timeouts.connect_secs = 2;
    config.timeouts.forward_secs = 5;
    config.routes = Vec::new();
    config
}

/// A protected route to `addr`.
pub fn route(name: &str, addr: SocketAddr) -> RouteConfig {
    RouteConfig::new(name, format!("http://{}", addr))
}

/// Start the gateway and return its address plus the handle that stops it.
pub async fn spawn_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let server = GatewayServer::new(config).expect("gateway should start");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (addr, shutdown)
}

/// Client that never pools, so each test observes fresh connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
