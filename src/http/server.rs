//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create Axum Router with the system routes (`/`, `/health`) and the dispatcher
//! - Wire up middleware (request id, tracing, CORS, timeout)
//! - Dispatch: route → method check → authenticate (protected routes) → forward → relay
//! - Translate every failure into a JSON `detail` response

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use http_body_util::LengthLimitError;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{AuthorityClient, IdentityClaim};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, StartupError};
use crate::health::{HealthAggregator, HealthReport};
use crate::http::cors::build_cors_layer;
use crate::http::request::{bearer_token, request_id};
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::proxy::request::carries_body;
use crate::proxy::{ForwardedRequest, ForwardedResponse, Forwarder, IdentityHeaders};
use crate::routing::{ResolvedRoute, RouteTable};

/// Methods the dispatcher forwards.
fn is_forwarded(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Application state injected into handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub authority: Arc<AuthorityClient>,
    pub forwarder: Arc<Forwarder>,
    pub health: Arc<HealthAggregator>,
    pub identity_headers: Option<Arc<IdentityHeaders>>,
    pub max_body_bytes: usize,
}

impl AppState {
    /// Build all request-time components from configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, StartupError> {
        let routes = RouteTable::new(&config.routes)?;
        let authority = AuthorityClient::new(&config.authority)?;
        let forwarder = Forwarder::new(&config.timeouts, config.forwarding.max_response_bytes);
        let health = HealthAggregator::new(&routes, &config.health_check);
        let identity_headers = IdentityHeaders::from_config(&config.forwarding)?.map(Arc::new);

        Ok(Self {
            routes: Arc::new(routes),
            authority: Arc::new(authority),
            forwarder: Arc::new(forwarder),
            health: Arc::new(health),
            identity_headers,
            max_body_bytes: config.forwarding.max_body_bytes,
        })
    }
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    /// Create a new gateway server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        let state = AppState::from_config(&config)?;

        for route in state.routes.routes() {
            tracing::info!(
                service = %route.name,
                prefix = %route.prefix(),
                backend = %route.backend_base_url,
                requires_auth = route.requires_auth,
                "Route registered"
            );
        }
        tracing::info!(authority = %state.authority.verify_url(), "Authority configured");

        let router = Self::build_router(&config, state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/", get(service_index))
            .route("/health", get(health_report))
            .fallback(dispatch)
            .method_not_allowed_fallback(method_not_allowed)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        let router = match build_cors_layer(&config.cors) {
            Some(cors) => router.layer(cors),
            None => router,
        };

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

/// `GET /`: static descriptor of the configured services.
async fn service_index(State(state): State<AppState>) -> Json<Value> {
    let routes = state.routes.routes();

    let endpoints: Map<String, Value> = routes
        .iter()
        .map(|route| {
            (
                route.name.clone(),
                json!({
                    "path": format!("{}/*", route.prefix()),
                    "requires_auth": route.requires_auth,
                }),
            )
        })
        .collect();

    Json(json!({
        "message": "Clinic API Gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "services": routes.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        "endpoints": endpoints,
    }))
}

/// `GET /health`: probe every backend now.
async fn health_report(State(state): State<AppState>) -> Json<HealthReport> {
    let report = state.health.check_all().await;
    tracing::debug!(all_healthy = report.all_healthy(), "Health report built");
    Json(report)
}

/// Wrong method on a system route.
async fn method_not_allowed(method: Method) -> Response {
    GatewayError::MethodNotAllowed(method).into_response()
}

/// Catch-all dispatcher for `/{service}/{rest...}`.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let request_id = request_id(request.headers()).to_string();
    let path = request.uri().path().to_string();

    let resolved = match state.routes.resolve(&path) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %path, "No route matched");
            metrics::record_request(method.as_str(), 404, "none", start);
            return GatewayError::from(e).into_response();
        }
    };
    let service = resolved.route.name.clone();

    if !is_forwarded(&method) {
        metrics::record_request(method.as_str(), 405, &service, start);
        return GatewayError::MethodNotAllowed(method).into_response();
    }

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        service = %service,
        "Dispatching request"
    );

    let response = match proxy_request(&state, resolved, request, &request_id).await {
        Ok(forwarded) => forwarded.into_response(),
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                service = %service,
                error = %e,
                "Request failed at gateway"
            );
            e.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), &service, start);
    response
}

/// Authenticate (when required), build the outbound request, and forward it.
async fn proxy_request(
    state: &AppState,
    resolved: ResolvedRoute<'_>,
    request: Request<Body>,
    request_id: &str,
) -> Result<ForwardedResponse, GatewayError> {
    let route = resolved.route;
    let (parts, body) = request.into_parts();

    let identity = if route.requires_auth {
        Some(authenticate(state, &parts.headers, request_id).await?)
    } else {
        None
    };

    let body = if carries_body(&parts.method) {
        let bytes = axum::body::to_bytes(body, state.max_body_bytes)
            .await
            .map_err(|e| {
                let inner = e.into_inner();
                if inner.is::<LengthLimitError>() {
                    GatewayError::PayloadTooLarge {
                        limit: state.max_body_bytes,
                    }
                } else {
                    GatewayError::BodyRead(inner.to_string())
                }
            })?;
        Some(bytes)
    } else {
        None
    };

    let mut forwarded = ForwardedRequest::new(
        parts.method,
        resolved.target_url(),
        &parts.headers,
        parts.uri.query(),
        body,
    );
    if let Some(policy) = &state.identity_headers {
        forwarded = forwarded.with_identity_headers(policy, identity.as_ref());
    }

    let response = state.forwarder.forward(forwarded).await?;

    tracing::debug!(
        request_id = %request_id,
        service = %route.name,
        status = %response.status,
        bytes = response.body.len(),
        "Backend responded"
    );
    Ok(response)
}

async fn authenticate(
    state: &AppState,
    headers: &axum::http::HeaderMap,
    request_id: &str,
) -> Result<IdentityClaim, GatewayError> {
    match state.authority.verify(bearer_token(headers)).await {
        Ok(identity) => {
            metrics::record_auth("verified");
            tracing::debug!(
                request_id = %request_id,
                subject = %identity.subject_id,
                role = %identity.role,
                "Identity verified"
            );
            Ok(identity)
        }
        Err(e) => {
            metrics::record_auth(e.kind());
            tracing::info!(request_id = %request_id, reason = %e, "Authentication failed");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteConfig;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn server() -> GatewayServer {
        let mut config = GatewayConfig::default();
        config.routes = vec![
            RouteConfig::new("auth", "http://127.0.0.1:9").public(),
            RouteConfig::new("patients", "http://127.0.0.1:9"),
        ];
        GatewayServer::new(config).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_service_index() {
        let response = server()
            .router()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = body_json(response).await;
        assert_eq!(body["services"], json!(["auth", "patients"]));
        assert_eq!(
            body["endpoints"]["patients"],
            json!({"path": "/patients/*", "requires_auth": true})
        );
        assert_eq!(body["endpoints"]["auth"]["requires_auth"], json!(false));
    }

    #[tokio::test]
    async fn test_unknown_service_is_404() {
        let response = server()
            .router()
            .oneshot(Request::get("/pharmacy/1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({"detail": "Service not found"}));
    }

    #[tokio::test]
    async fn test_missing_token_is_401_before_any_call() {
        let response = server()
            .router()
            .oneshot(Request::get("/patients/42").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({"detail": "Not authenticated"}));
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::TRACE)
                    .uri("/patients/42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_json(response).await, json!({"detail": "Method not allowed"}));
    }

    #[tokio::test]
    async fn test_unknown_service_wins_over_unsupported_method() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::HEAD)
                    .uri("/pharmacy/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_method_on_system_routes_is_json() {
        for uri in ["/", "/health"] {
            let response = server()
                .router()
                .oneshot(Request::post(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(body_json(response).await, json!({"detail": "Method not allowed"}));
        }
    }

    #[tokio::test]
    async fn test_preflight_answered_before_dispatch() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/patients/42")
                    .header("origin", "http://localhost:3000")
                    .header("access-control-request-method", "GET")
                    .header("access-control-request-headers", "authorization")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "http://localhost:3000");
        assert_eq!(headers["access-control-allow-methods"], "GET");
        assert_eq!(headers["access-control-allow-headers"], "authorization");
        assert_eq!(headers["access-control-allow-credentials"], "true");
    }

    #[test]
    fn test_invalid_routes_fail_startup() {
        let mut config = GatewayConfig::default();
        config.routes.push(RouteConfig::new("patients", "http://other"));
        assert!(matches!(
            GatewayServer::new(config),
            Err(StartupError::Route(_))
        ));
    }
}
