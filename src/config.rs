//! Refresh pipeline configuration.
//!
//! The defaults below are the operational constants of the batch; binaries may
//! override the knobs from the environment at startup, but the pipeline itself
//! only ever sees an explicit [`RefreshConfig`] value so tests can inject
//! their own.

use crate::util::env::{env_opt, env_parse};

pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_OMDB_BASE_URL: &str = "https://www.omdbapi.com";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// Fallback title when neither language yields one.
pub const UNKNOWN_TITLE: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Listing region for the now-playing catalog.
    pub region: String,
    /// Language the catalog source is queried in first.
    pub primary_language: String,
    /// Second persisted language; falls back to primary-language fields.
    pub secondary_language: String,
    /// How many movies may be enriched simultaneously. Kept low to protect
    /// the providers and the store's connection pool.
    pub movie_concurrency: usize,
    /// Actor fan-out ceiling within one movie. Each actor costs ~5 downstream
    /// calls, so the default is effectively serial.
    pub actor_concurrency: usize,
    /// Fixed pause after each actor, in milliseconds.
    pub actor_delay_ms: u64,
    /// Cast entries processed per movie, by source order.
    pub cast_limit: usize,
    pub tmdb_base_url: String,
    pub omdb_base_url: String,
    pub image_base_url: String,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            region: "US".to_string(),
            primary_language: "en".to_string(),
            secondary_language: "de".to_string(),
            movie_concurrency: 2,
            actor_concurrency: 1,
            actor_delay_ms: 250,
            cast_limit: 10,
            tmdb_base_url: DEFAULT_TMDB_BASE_URL.to_string(),
            omdb_base_url: DEFAULT_OMDB_BASE_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
        }
    }
}

impl RefreshConfig {
    /// Defaults with env overrides applied. Binary entry points only.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            region: env_opt("REFRESH_REGION").unwrap_or(defaults.region),
            primary_language: env_opt("REFRESH_PRIMARY_LANG").unwrap_or(defaults.primary_language),
            secondary_language: env_opt("REFRESH_SECONDARY_LANG")
                .unwrap_or(defaults.secondary_language),
            movie_concurrency: env_parse("MOVIE_CONCURRENCY", defaults.movie_concurrency).max(1),
            actor_concurrency: env_parse("ACTOR_CONCURRENCY", defaults.actor_concurrency).max(1),
            actor_delay_ms: env_parse("ACTOR_DELAY_MS", defaults.actor_delay_ms),
            cast_limit: env_parse("CAST_LIMIT", defaults.cast_limit),
            tmdb_base_url: env_opt("TMDB_BASE_URL").unwrap_or(defaults.tmdb_base_url),
            omdb_base_url: env_opt("OMDB_BASE_URL").unwrap_or(defaults.omdb_base_url),
            image_base_url: env_opt("IMAGE_BASE_URL").unwrap_or(defaults.image_base_url),
        }
    }
}
