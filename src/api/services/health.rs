//! 存活与就绪检查

use std::time::Duration;

use actix_web::{HttpResponse, Responder, http::StatusCode};
use serde::Serialize;
use tracing::{error, trace};

use super::helpers::Services;

#[derive(Debug, Serialize)]
pub struct DatabaseCheck {
    pub reachable: bool,
    pub backend: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub uptime_secs: u64,
    pub database: DatabaseCheck,
}

pub async fn health_check(services: Services) -> impl Responder {
    trace!("Received health check request");

    let reachable = tokio::time::timeout(Duration::from_secs(5), services.storage.ping())
        .await
        .unwrap_or(false);
    if !reachable {
        error!("Health check: database unreachable");
    }

    let body = HealthResponse {
        status: if reachable { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_secs: services.started_at.elapsed().as_secs(),
        database: DatabaseCheck {
            reachable,
            backend: services.storage.backend_name().to_string(),
        },
    };

    let status = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    HttpResponse::build(status).json(body)
}

pub async fn liveness_check() -> impl Responder {
    HttpResponse::NoContent().finish()
}
