//! Gateway-local endpoints: liveness and the service listing.
//!
//! Both are pure reads over process start time and the immutable registry.

use std::time::Instant;

use axum::extract::State;
use axum::response::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;
use crate::routing::ServiceRegistry;

pub const HEALTH_PATH: &str = "/health";
pub const SERVICES_PATH: &str = "/services";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    /// Seconds since the gateway started.
    pub uptime: f64,
    /// RFC 3339 / ISO-8601, UTC.
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInfo {
    pub name: String,
    pub prefix: String,
    pub url: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceList {
    pub total: usize,
    pub services: Vec<ServiceInfo>,
}

pub fn health_status(started_at: Instant) -> HealthStatus {
    HealthStatus {
        status: "Gateway Running".to_string(),
        uptime: started_at.elapsed().as_secs_f64(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

pub fn service_list(registry: &ServiceRegistry) -> ServiceList {
    let services: Vec<ServiceInfo> = registry
        .list()
        .iter()
        .map(|entry| ServiceInfo {
            name: entry.name.clone(),
            prefix: entry.url_prefix.clone(),
            url: entry.target_base_url.clone(),
            description: entry.description.clone(),
        })
        .collect();

    ServiceList {
        total: services.len(),
        services,
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(health_status(state.started_at))
}

/// `GET /services`
pub async fn services(State(state): State<AppState>) -> Json<ServiceList> {
    Json(service_list(state.router.registry()))
}
