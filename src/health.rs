//! Liveness, health and metrics endpoints.

use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;

/// `GET /` - minimal liveness signal.
pub async fn heartbeat() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "Warehouse is online" }))
}

/// `GET /health` and `GET /api/v1/health`.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let metrics = state.get_metrics_snapshot();
    let uploads = state.uploads.stats().await;

    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "services": {
            "websocket": "online",
            "chat": "online",
            "transcribe": "online",
            "file_storage": "online"
        },
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.get_uptime_seconds(),
        "server": {
            "host": state.config.server.host,
            "port": state.config.server.port
        },
        "metrics": {
            "total_requests": metrics.request_count,
            "total_errors": metrics.error_count,
            "error_rate": metrics.error_rate(),
            "active_sessions": metrics.active_sessions
        },
        "connections": state.registry.len(),
        "uploads": uploads
    }))
}

/// `GET /api/v1/metrics` - per-route request statistics.
pub async fn detailed_metrics(state: web::Data<AppState>) -> HttpResponse {
    let metrics = state.get_metrics_snapshot();
    let uptime_seconds = state.get_uptime_seconds();

    let mut endpoint_stats: Vec<_> = metrics
        .endpoint_metrics
        .iter()
        .map(|(endpoint, metric)| {
            json!({
                "endpoint": endpoint,
                "request_count": metric.request_count,
                "error_count": metric.error_count,
                "error_rate": metric.error_rate(),
                "average_duration_ms": metric.average_duration_ms(),
                "total_duration_ms": metric.total_duration_ms
            })
        })
        .collect();
    endpoint_stats.sort_by(|a, b| b["request_count"].as_u64().cmp(&a["request_count"].as_u64()));

    HttpResponse::Ok().json(json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds,
        "overall": {
            "total_requests": metrics.request_count,
            "total_errors": metrics.error_count,
            "error_rate": metrics.error_rate(),
            "active_sessions": metrics.active_sessions,
            "registered_connections": state.registry.len(),
            "requests_per_second": if uptime_seconds > 0 {
                metrics.request_count as f64 / uptime_seconds as f64
            } else {
                0.0
            }
        },
        "endpoints": endpoint_stats
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::MetricsMiddleware;
    use crate::state::test_support::app_state_with;
    use crate::storage::memory::MemoryStorage;
    use crate::websocket::test_support::{spawn_session, wait_for_registration};
    use actix_web::{test, App};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[actix_web::test]
    async fn test_heartbeat() {
        let app = test::init_service(App::new().route("/", web::get().to(heartbeat))).await;
        let req = test::TestRequest::get().uri("/").to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp, json!({ "status": "Warehouse is online" }));
    }

    #[actix_web::test]
    async fn test_health_reports_services_and_uploads() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert_aged("a.wav", b"data", Duration::from_secs(60));
        let state = app_state_with(storage);
        let (tx, _rx) = mpsc::unbounded_channel();
        spawn_session(&state, "chat-1", tx);
        wait_for_registration(&state, "chat-1", None).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/health", web::get().to(health_check)),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp["status"], "healthy");
        assert_eq!(resp["services"]["file_storage"], "online");
        assert_eq!(resp["uploads"]["total_files"], 1);
        assert_eq!(resp["connections"], 1);
    }

    #[actix_web::test]
    async fn test_metrics_group_by_route() {
        let state = app_state_with(Arc::new(MemoryStorage::new()));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(MetricsMiddleware)
                .route("/", web::get().to(heartbeat))
                .route("/api/v1/metrics", web::get().to(detailed_metrics)),
        )
        .await;

        for _ in 0..3 {
            test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        }

        let req = test::TestRequest::get().uri("/api/v1/metrics").to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp["overall"]["total_requests"], 4);
        assert_eq!(resp["endpoints"][0]["endpoint"], "GET /");
        assert_eq!(resp["endpoints"][0]["request_count"], 3);
    }
}
