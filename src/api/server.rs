// Trigger server implementation using actix-web

use crate::api::{middleware, routes};
use crate::refresh::RefreshJob;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;

pub struct TriggerServer {
    pub host: String,
    pub port: u16,
    /// Scheduler signature secret; verification is bypassed when unset.
    pub signature_secret: Option<String>,
    pub allowed_origins: String,
}

impl TriggerServer {
    /// Create server from environment variables
    pub fn from_env() -> Result<Self> {
        crate::util::env::init_env();

        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .context("Invalid API_PORT")?;
        let signature_secret = crate::util::env::env_opt("SCHEDULER_SECRET");
        let allowed_origins =
            env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            host,
            port,
            signature_secret,
            allowed_origins,
        })
    }

    pub async fn run(self, job: Arc<RefreshJob>) -> Result<()> {
        if self.signature_secret.is_none() {
            tracing::warn!("SCHEDULER_SECRET not set; trigger signature checks are bypassed");
        }
        tracing::info!(host = %self.host, port = self.port, "starting trigger server");

        let signature_secret = self.signature_secret.clone();
        let allowed_origins = self.allowed_origins.clone();
        let data = web::Data::new(job);

        HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            App::new()
                .app_data(data.clone())
                .wrap(logger)
                .wrap(compress)
                .wrap(middleware::setup_cors(&allowed_origins))
                .configure(|cfg| routes::configure_routes(cfg, signature_secret.clone()))
        })
        .bind((self.host.as_str(), self.port))
        .context("failed to bind trigger server")?
        .run()
        .await
        .context("trigger server terminated")?;

        Ok(())
    }
}
