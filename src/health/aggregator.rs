//! Concurrent liveness probing of every backend.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request};
use futures_util::future::join_all;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::health::report::{HealthReport, ServiceHealth};
use crate::observability::metrics;
use crate::proxy::forwarder::describe;
use crate::routing::RouteTable;

/// A backend to probe.
#[derive(Debug, Clone)]
struct ProbeTarget {
    name: String,
    base_url: String,
}

/// Probes every registered backend and builds a fresh report each call.
pub struct HealthAggregator {
    targets: Vec<ProbeTarget>,
    client: Client<HttpConnector, Body>,
    path: String,
    timeout: Duration,
}

impl HealthAggregator {
    pub fn new(routes: &RouteTable, config: &HealthCheckConfig) -> Self {
        let targets = routes
            .routes()
            .iter()
            .map(|route| ProbeTarget {
                name: route.name.clone(),
                base_url: route.backend_base_url.clone(),
            })
            .collect();

        let timeout = Duration::from_secs(config.timeout_secs);
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            targets,
            client,
            path: format!("/{}", config.path.trim_start_matches('/')),
            timeout,
        }
    }

    /// Probe all backends concurrently. Never fails; every backend gets an entry.
    pub async fn check_all(&self) -> HealthReport {
        let probes = self.targets.iter().map(|target| async move {
            let health = self.probe(target).await;
            tracing::debug!(service = %target.name, status = health.status.as_str(), "Backend probed");
            metrics::record_backend_health(&target.name, health.status);
            (target.name.clone(), health)
        });

        join_all(probes).await.into_iter().collect()
    }

    async fn probe(&self, target: &ProbeTarget) -> ServiceHealth {
        let uri = format!("{}{}", target.base_url, self.path);

        let request = match Request::builder()
            .method("GET")
            .uri(uri.as_str())
            .header(header::USER_AGENT, "clinic-gateway-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(service = %target.name, error = %e, "Failed to build health check request");
                return ServiceHealth::down(&target.base_url, e.to_string());
            }
        };

        match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let status = response.status();
                if !status.is_success() {
                    tracing::warn!(service = %target.name, status = %status, "Health check failed: non-success status");
                }
                ServiceHealth::responded(&target.base_url, status.as_u16())
            }
            Ok(Err(e)) => {
                let error = describe(&e);
                tracing::warn!(service = %target.name, error = %error, "Health check failed: connection error");
                ServiceHealth::down(&target.base_url, error)
            }
            Err(_) => {
                tracing::warn!(service = %target.name, "Health check failed: timeout");
                ServiceHealth::down(
                    &target.base_url,
                    format!("no response within {}s", self.timeout.as_secs()),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteConfig;
    use crate::health::HealthStatus;

    #[tokio::test]
    async fn test_every_backend_down_still_yields_full_report() {
        let mut addrs = Vec::new();
        for _ in 0..2 {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            addrs.push(listener.local_addr().unwrap());
        }
        // Each listener is dropped at the end of its iteration, so both ports refuse.

        let routes = RouteTable::new(&[
            RouteConfig::new("patients", format!("http://{}", addrs[0])),
            RouteConfig::new("doctors", format!("http://{}", addrs[1])),
        ])
        .unwrap();
        let aggregator = HealthAggregator::new(
            &routes,
            &HealthCheckConfig {
                timeout_secs: 1,
                ..HealthCheckConfig::default()
            },
        );

        let report = aggregator.check_all().await;

        assert_eq!(report.len(), 2);
        for (_, health) in report.iter() {
            assert_eq!(health.status, HealthStatus::Down);
            assert!(health.error.is_some());
        }
        assert_eq!(
            report.get("patients").unwrap().url,
            format!("http://{}", addrs[0])
        );
    }
}
