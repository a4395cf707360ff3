//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::observability::RequestId;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub storage: &'static str,
    pub timestamp: String,
    pub request_id: String,
}

/// GET /api/health
///
/// Reports 503 when a configured database stops answering.
pub async fn health_check(state: web::Data<AppState>, request_id: RequestId) -> HttpResponse {
    let (status, storage) = match &state.db {
        Some(db) => match ping(db).await {
            Ok(()) => ("ok", "postgres"),
            Err(e) => {
                tracing::error!(error = %e, "Database health check failed");
                ("degraded", "postgres")
            }
        },
        None => ("ok", "memory"),
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        storage,
        timestamp: chrono::Utc::now().to_rfc3339(),
        request_id: request_id.as_str().to_string(),
    };

    if status == "ok" {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

#[cfg(feature = "postgres")]
async fn ping(db: &scribe_infra::DatabaseConnections) -> Result<(), String> {
    db.ping().await.map_err(|e| e.to_string())
}

#[cfg(not(feature = "postgres"))]
async fn ping(_db: &scribe_infra::DatabaseConnections) -> Result<(), String> {
    Ok(())
}
