// API route configuration

use crate::api::{auth, handlers};
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig, signature_secret: Option<String>) {
    cfg
        // Health check (no signature required)
        .route("/health", web::get().to(handlers::health_check))
        .route("/", web::get().to(handlers::health_check))
        // Scheduler-triggered refresh (signature verified in production)
        .service(
            web::scope("/api/v1")
                .wrap(auth::SchedulerSignature::new(signature_secret))
                .route("/refresh", web::post().to(handlers::trigger_refresh)),
        );
}
