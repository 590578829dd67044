use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static ERROR_COUNT: AtomicU64 = AtomicU64::new(0);
static FOLLOW_COUNT: AtomicU64 = AtomicU64::new(0);
static UNFOLLOW_COUNT: AtomicU64 = AtomicU64::new(0);
static RELAY_EVENT_COUNT: AtomicU64 = AtomicU64::new(0);
static RELAY_CONNECTIONS: AtomicU64 = AtomicU64::new(0);

pub fn increment_error_count() {
    ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_follows() {
    FOLLOW_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_unfollows() {
    UNFOLLOW_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_relay_events() {
    RELAY_EVENT_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn connection_opened() {
    RELAY_CONNECTIONS.fetch_add(1, Ordering::Relaxed);
}

pub fn connection_closed() {
    // Nunca abaixo de zero
    let _ = RELAY_CONNECTIONS.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub http_errors_total: u64,
    pub follows_total: u64,
    pub unfollows_total: u64,
    pub relay_events_total: u64,
    pub relay_connections: u64,
}

impl MetricsResponse {
    fn snapshot() -> Self {
        MetricsResponse {
            http_errors_total: ERROR_COUNT.load(Ordering::Relaxed),
            follows_total: FOLLOW_COUNT.load(Ordering::Relaxed),
            unfollows_total: UNFOLLOW_COUNT.load(Ordering::Relaxed),
            relay_events_total: RELAY_EVENT_COUNT.load(Ordering::Relaxed),
            relay_connections: RELAY_CONNECTIONS.load(Ordering::Relaxed),
        }
    }

    fn render(&self) -> String {
        format!(
            "# HELP http_errors_total Total number of HTTP error responses\n\
             # TYPE http_errors_total counter\n\
             http_errors_total {}\n\
             \n\
             # HELP follows_total Successful follow operations\n\
             # TYPE follows_total counter\n\
             follows_total {}\n\
             \n\
             # HELP unfollows_total Successful unfollow operations\n\
             # TYPE unfollows_total counter\n\
             unfollows_total {}\n\
             \n\
             # HELP relay_events_total Events published on the relay\n\
             # TYPE relay_events_total counter\n\
             relay_events_total {}\n\
             \n\
             # HELP relay_connections Open relay WebSocket connections\n\
             # TYPE relay_connections gauge\n\
             relay_connections {}\n",
            self.http_errors_total,
            self.follows_total,
            self.unfollows_total,
            self.relay_events_total,
            self.relay_connections
        )
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus metrics", body = String, content_type = "text/plain")
    )
)]
pub async fn get_metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(MetricsResponse::snapshot().render())
}
