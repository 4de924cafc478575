// HTTP request handlers for the trigger surface

use crate::api::models::{HealthResponse, RefreshResponse};
use crate::refresh::RefreshJob;
use actix_web::{web, HttpResponse, Result};
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check(job: web::Data<Arc<RefreshJob>>) -> Result<HttpResponse> {
    let db_status = match sqlx::query_scalar::<_, bool>("SELECT true")
        .fetch_one(&job.db.pool)
        .await
    {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        database: db_status.to_string(),
    }))
}

/// Scheduler trigger: run one refresh batch and report the processed count.
pub async fn trigger_refresh(job: web::Data<Arc<RefreshJob>>) -> Result<HttpResponse> {
    tracing::info!("refresh trigger received");
    match job.run().await {
        Ok(summary) => {
            Ok(HttpResponse::Ok().json(RefreshResponse::success(summary.processed)))
        }
        Err(err) => {
            tracing::error!(error = %err, "refresh batch failed");
            Ok(HttpResponse::InternalServerError()
                .json(RefreshResponse::failure(err.to_string())))
        }
    }
}
