use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use reelwatch::api::server::TriggerServer;
use reelwatch::config::RefreshConfig;
use reelwatch::database_ops::db::Db;
use reelwatch::database_ops::omdb::OmdbProvider;
use reelwatch::database_ops::tmdb::TmdbProvider;
use reelwatch::refresh::notify::{LogNotifier, Notifier, WebhookNotifier};
use reelwatch::refresh::RefreshJob;
use reelwatch::util::env as env_util;

#[derive(Parser)]
#[command(name = "reelwatch", about = "Now-playing catalog refresh and alert batch")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one refresh batch and exit (for cron-style schedulers)
    Refresh,
    /// Serve the HTTP trigger endpoint for an external scheduler
    Serve,
}

async fn build_job() -> Result<RefreshJob> {
    let config = RefreshConfig::from_env();

    let database_url = env_util::env_req("DATABASE_URL")?;
    let max_connections = env_util::env_parse("DB_MAX_CONNECTIONS", 5u32);
    let db = Db::connect(&database_url, max_connections).await?;

    let tmdb = TmdbProvider::new(Some(&config.tmdb_base_url), None)?
        .with_api_key(env_util::env_opt("TMDB_API_KEY"));
    let omdb = OmdbProvider::new(Some(&config.omdb_base_url), None)?
        .with_api_key(env_util::env_opt("OMDB_API_KEY"));

    let notifier: Arc<dyn Notifier> = match env_util::env_opt("NOTIFIER_URL") {
        Some(url) => Arc::new(WebhookNotifier::new(url)?),
        None => Arc::new(LogNotifier),
    };

    Ok(RefreshJob {
        db,
        tmdb,
        omdb,
        notifier,
        config,
    })
}

#[actix_web::main]
async fn main() -> Result<()> {
    env_util::init_env();
    reelwatch::logging::init_tracing("reelwatch=info,sqlx=warn")?;

    let cli = Cli::parse();
    match cli.command {
        Command::Refresh => {
            let job = build_job().await?;
            let summary = job.run().await?;
            info!(
                listed = summary.listed,
                processed = summary.processed,
                failed = summary.failed,
                "refresh finished"
            );
        }
        Command::Serve => {
            let job = Arc::new(build_job().await?);
            let server = TriggerServer::from_env()?;
            server.run(job).await?;
        }
    }
    Ok(())
}
