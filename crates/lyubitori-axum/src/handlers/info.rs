//! Service info and liveness.

use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::routes::ENDPOINTS;

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: String,
}

pub async fn index() -> Json<ServiceInfo> {
    let endpoints = ENDPOINTS
        .iter()
        .map(|(route, description)| ((*route).to_string(), Value::from(*description)))
        .collect();

    Json(ServiceInfo {
        service: "Lyubitori API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints,
    })
}

pub async fn health() -> Json<Health> {
    Json(Health {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
    })
}
