use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::database::UserStore;
use crate::relay::RelayHub;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub store: String,
    pub relay_connections: usize,
    pub timestamp: i64,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "User store unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(store: web::Data<dyn UserStore>, hub: web::Data<RelayHub>) -> impl Responder {
    let store_status = match store.ping().await {
        Ok(()) => "up".to_string(),
        Err(e) => {
            log::error!("❌ Health check: store unreachable: {}", e);
            "down".to_string()
        }
    };
    let healthy = store_status == "up";

    let body = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        service: "social-relay".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: store_status,
        relay_connections: hub.connection_count(),
        timestamp: chrono::Utc::now().timestamp(),
    };

    if healthy {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
