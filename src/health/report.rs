//! Health report types.

use std::collections::BTreeMap;

use serde::Serialize;

/// Liveness classification of one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Responded with 2xx.
    Healthy,
    /// Responded, but not with 2xx.
    Unhealthy,
    /// Did not respond: transport failure or timeout.
    Down,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Down => "down",
        }
    }
}

/// Probe outcome for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceHealth {
    pub fn responded(url: impl Into<String>, status_code: u16) -> Self {
        let status = if (200..300).contains(&status_code) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };
        Self {
            status,
            url: url.into(),
            status_code: Some(status_code),
            error: None,
        }
    }

    pub fn down(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Down,
            url: url.into(),
            status_code: None,
            error: Some(error.into()),
        }
    }
}

/// Consolidated liveness of every backend, keyed by service name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HealthReport {
    services: BTreeMap<String, ServiceHealth>,
}

impl HealthReport {
    pub fn get(&self, service: &str) -> Option<&ServiceHealth> {
        self.services.get(service)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ServiceHealth)> {
        self.services.iter()
    }

    /// True when every service is healthy.
    pub fn all_healthy(&self) -> bool {
        self.services
            .values()
            .all(|s| s.status == HealthStatus::Healthy)
    }
}

impl FromIterator<(String, ServiceHealth)> for HealthReport {
    fn from_iter<I: IntoIterator<Item = (String, ServiceHealth)>>(iter: I) -> Self {
        Self {
            services: iter.into_iter().collect(),
        }
    }
}
