//! Cross-origin policy for browser clients.

use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::CorsConfig;
use crate::http::request::X_REQUEST_ID;

/// Build the CORS layer, or `None` when cross-origin access is disabled.
///
/// A `"*"` origin mirrors the caller's `Origin`, methods and headers back, so
/// credentialed requests keep working. Preflights are answered here and never
/// reach the dispatcher.
pub fn build_cors_layer(config: &CorsConfig) -> Option<CorsLayer> {
    if !config.enabled {
        return None;
    }

    let origin = if config.allows_any_origin() {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| {
                origin.parse::<HeaderValue>().ok().or_else(|| {
                    tracing::warn!(origin = %origin, "CORS: ignoring invalid origin");
                    None
                })
            })
            .collect();
        tracing::info!("CORS: allowing {} origin(s)", origins.len());
        AllowOrigin::list(origins)
    };

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .expose_headers([X_REQUEST_ID.clone()])
            .allow_credentials(config.allow_credentials),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    fn app(config: &CorsConfig) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(build_cors_layer(config).unwrap())
    }

    #[test]
    fn test_disabled_yields_no_layer() {
        let config = CorsConfig {
            enabled: false,
            ..CorsConfig::default()
        };
        assert!(build_cors_layer(&config).is_none());
    }

    #[tokio::test]
    async fn test_any_origin_is_echoed_with_credentials() {
        let response = app(&CorsConfig::default())
            .oneshot(
                Request::get("/")
                    .header("origin", "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "http://localhost:3000"
        );
        assert_eq!(response.headers()["access-control-allow-credentials"], "true");
    }

    #[tokio::test]
    async fn test_unlisted_origin_gets_no_grant() {
        let config = CorsConfig {
            allowed_origins: vec!["http://clinic.test".into()],
            ..CorsConfig::default()
        };
        let response = app(&config)
            .oneshot(
                Request::get("/")
                    .header("origin", "http://evil.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(!response.headers().contains_key("access-control-allow-origin"));
    }
}
