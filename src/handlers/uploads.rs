//! Upload directory maintenance endpoints.
//!
//! - `GET /api/v1/uploads/stats` - file count and total size
//! - `POST /api/v1/uploads/cleanup?max_age_hours=N` - remove old uploads

use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct CleanupParams {
    /// Age threshold; falls back to `maintenance.cleanup_max_age_hours`
    pub max_age_hours: Option<u64>,
}

/// Current contents of the upload directory. Never fails; an unreadable
/// directory reports zeros.
pub async fn upload_stats(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.uploads.stats().await)
}

/// Remove uploads older than the threshold.
///
/// ## Response:
/// ```json
/// { "removed_files": 3, "max_age_hours": 24, "timestamp": "..." }
/// ```
pub async fn cleanup_uploads(
    state: web::Data<AppState>,
    params: web::Query<CleanupParams>,
) -> HttpResponse {
    let max_age_hours = params
        .max_age_hours
        .unwrap_or(state.config.maintenance.cleanup_max_age_hours);

    let removed = state.uploads.cleanup(max_age_hours).await;
    info!("Manual cleanup removed {} file(s) older than {}h", removed, max_age_hours);

    HttpResponse::Ok().json(json!({
        "removed_files": removed,
        "max_age_hours": max_age_hours,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::app_state_with;
    use crate::storage::memory::MemoryStorage;
    use actix_web::{test, App};
    use std::sync::Arc;
    use std::time::Duration;

    const HOUR: Duration = Duration::from_secs(3600);

    #[actix_web::test]
    async fn test_stats_reports_stored_files() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert_aged("a.wav", &[0u8; 1024 * 1024], HOUR);
        storage.insert_aged("b.wav", &[0u8; 512 * 1024], HOUR);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state_with(storage)))
                .route("/api/v1/uploads/stats", web::get().to(upload_stats)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/uploads/stats").to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp["total_files"], 2);
        assert_eq!(resp["total_size_mb"], 1.5);
        assert_eq!(resp["upload_dir"], "memory://uploads");
    }

    #[actix_web::test]
    async fn test_stats_degrades_to_zeros() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state_with(Arc::new(MemoryStorage::failing_list()))))
                .route("/api/v1/uploads/stats", web::get().to(upload_stats)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/uploads/stats").to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp["total_files"], 0);
        assert_eq!(resp["total_size_mb"], 0.0);
    }

    #[actix_web::test]
    async fn test_cleanup_uses_query_or_configured_age() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert_aged("old.wav", b"old", 25 * HOUR);
        storage.insert_aged("recent.wav", b"new", 2 * HOUR);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state_with(storage.clone())))
                .route("/api/v1/uploads/cleanup", web::post().to(cleanup_uploads)),
        )
        .await;

        // Default threshold is 24h
        let req = test::TestRequest::post().uri("/api/v1/uploads/cleanup").to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["removed_files"], 1);
        assert_eq!(resp["max_age_hours"], 24);
        assert!(!storage.contains("old.wav"));

        let req = test::TestRequest::post()
            .uri("/api/v1/uploads/cleanup?max_age_hours=1")
            .to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["removed_files"], 1);
        assert_eq!(storage.len(), 0);
    }
}
