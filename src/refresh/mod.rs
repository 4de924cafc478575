//! Catalog refresh batch: iterate the now-playing listing, enrich each movie,
//! and evaluate alert subscriptions. One invocation per scheduler trigger.

pub mod cast;
pub mod context;
pub mod genres;
pub mod movie;
pub mod notify;

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use crate::config::RefreshConfig;
use crate::database_ops::db::Db;
use crate::database_ops::omdb::OmdbProvider;
use crate::database_ops::tmdb::TmdbProvider;
use crate::refresh::context::RunContext;
use crate::refresh::notify::Notifier;

/// Everything one refresh run needs. Built once at startup and shared across
/// the trigger surface and the CLI.
pub struct RefreshJob {
    pub db: Db,
    pub tmdb: TmdbProvider,
    pub omdb: OmdbProvider,
    pub notifier: Arc<dyn Notifier>,
    pub config: RefreshConfig,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub listed: usize,
    pub processed: usize,
    pub failed: usize,
}

impl RefreshJob {
    /// Run one full refresh. A movie failing at any stage is logged and does
    /// not abort the rest of the listing; only a wholly-unreachable catalog
    /// source fails the batch.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<RunSummary> {
        let cfg = &self.config;

        // Secondary-language genre names, cached for the whole run. A miss
        // here only degrades genre translations to the primary name.
        let secondary_genre_names: HashMap<i64, String> =
            match self.tmdb.genre_list(&cfg.secondary_language).await {
                Ok(list) => list.into_iter().map(|g| (g.id, g.name)).collect(),
                Err(err) => {
                    warn!(error = %err, "secondary genre list fetch failed; using primary names");
                    HashMap::new()
                }
            };
        let ctx = RunContext::new(secondary_genre_names);

        let listing = self
            .tmdb
            .now_playing(&cfg.region, &cfg.primary_language)
            .await
            .context("now-playing listing fetch failed")?;
        info!(
            count = listing.len(),
            region = %cfg.region,
            "refreshing now-playing catalog"
        );

        let sem = Arc::new(Semaphore::new(cfg.movie_concurrency.max(1)));
        let mut tasks = FuturesUnordered::new();
        for item in &listing {
            let sem = sem.clone();
            let ctx = &ctx;
            tasks.push(async move {
                let _permit = sem.acquire().await.ok();
                let result = movie::process_movie(self, ctx, item).await;
                (item.id, result)
            });
        }

        let mut summary = RunSummary {
            listed: listing.len(),
            ..Default::default()
        };
        while let Some((tmdb_id, result)) = tasks.next().await {
            match result {
                Ok(()) => summary.processed += 1,
                Err(err) => {
                    summary.failed += 1;
                    warn!(tmdb_id, error = %err, "movie refresh failed; continuing with listing");
                }
            }
        }

        info!(
            listed = summary.listed,
            processed = summary.processed,
            failed = summary.failed,
            "refresh run complete"
        );
        Ok(summary)
    }
}
