//! Per-movie enrichment: canonical record, bilingual translations, trailers,
//! genre links, and cast links for one listing item.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, instrument, warn};

use crate::config::UNKNOWN_TITLE;
use crate::database_ops::catalog::{
    self, MovieUpsert, TrailerRow, TranslationUpsert,
};
use crate::database_ops::tmdb::provider::{ListingMovie, MovieDetails, Video};
use crate::normalization::rating::{reconcile, FallbackRating, PrimaryRating, ReconciledRating};
use crate::refresh::context::RunContext;
use crate::refresh::{cast, genres, notify, RefreshJob};

/// Canonical movie key: the cross-reference (IMDb) id when known, else a
/// deterministic synthetic key derived from the source's internal id.
pub fn canonical_movie_id(imdb_id: Option<&str>, tmdb_id: i64) -> String {
    match imdb_id.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => format!("tmdb-{tmdb_id}"),
    }
}

/// Localized field set before persistence; built per language.
#[derive(Debug, Clone, Default)]
pub(crate) struct TranslationFields {
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub description: Option<String>,
    pub poster_url: Option<String>,
}

impl TranslationFields {
    fn from_details(details: &MovieDetails, image_base: &str) -> Self {
        Self {
            title: details.title.clone(),
            original_title: details.original_title.clone(),
            description: details.overview.clone(),
            poster_url: poster_url(details.poster_path.as_deref(), image_base),
        }
    }
}

pub(crate) fn poster_url(path: Option<&str>, image_base: &str) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{image_base}{p}"))
}

/// Secondary-language fields fall back per-field to the primary values, and
/// further to the literal "Unknown" for the title only.
pub(crate) fn secondary_fields(
    secondary: TranslationFields,
    primary: &TranslationFields,
) -> TranslationFields {
    TranslationFields {
        title: secondary
            .title
            .or_else(|| primary.title.clone())
            .or_else(|| Some(UNKNOWN_TITLE.to_string())),
        original_title: secondary
            .original_title
            .or_else(|| primary.original_title.clone()),
        description: secondary
            .description
            .or_else(|| primary.description.clone()),
        poster_url: secondary
            .poster_url
            .or_else(|| primary.poster_url.clone()),
    }
}

/// Keep YouTube trailers only.
pub(crate) fn trailer_rows(movie_id: &str, videos: &[Video]) -> Vec<TrailerRow> {
    videos
        .iter()
        .filter(|v| v.kind == "Trailer" && v.site == "YouTube")
        .map(|v| TrailerRow {
            movie_id: movie_id.to_string(),
            video_key: v.key.clone(),
            name: v.name.clone(),
        })
        .collect()
}

fn parse_release_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

/// §4.1 policy: the primary provider wins only when both of its string fields
/// parse; otherwise the fallback aggregate is consulted. Either provider
/// failing to answer is "no data from that provider", never an error.
async fn resolve_rating(job: &RefreshJob, imdb_id: Option<&str>) -> ReconciledRating {
    let Some(imdb_id) = imdb_id else {
        return ReconciledRating::default();
    };

    let primary: Option<PrimaryRating> = match job.omdb.title_by_imdb_id(imdb_id).await {
        Ok(found) => found.map(|t| t.into_primary_rating()),
        Err(err) => {
            warn!(imdb_id, error = %err, "primary rating fetch failed; treating as no data");
            None
        }
    };
    if let Some(complete) = primary.as_ref().and_then(PrimaryRating::parse) {
        return complete;
    }

    let fallback: Option<FallbackRating> = match job.tmdb.rating_by_imdb_id(imdb_id).await {
        Ok(found) => found.map(|agg| FallbackRating {
            rating: agg.vote_average,
            votes: agg.vote_count,
        }),
        Err(err) => {
            warn!(imdb_id, error = %err, "fallback rating fetch failed; treating as no data");
            None
        }
    };
    reconcile(primary.as_ref(), fallback.as_ref())
}

/// Full enrichment for one listing item. Errors propagate to the orchestrator,
/// which logs and moves on to the next movie.
#[instrument(skip(job, ctx, item), fields(tmdb_id = item.id))]
pub async fn process_movie(job: &RefreshJob, ctx: &RunContext, item: &ListingMovie) -> Result<()> {
    let cfg = &job.config;

    let external_ids = job
        .tmdb
        .external_ids(item.id)
        .await
        .context("cross-reference id lookup failed")?;
    let movie_id = canonical_movie_id(external_ids.imdb_id.as_deref(), item.id);

    // Already known: skip all remote enrichment. Pure optimization, the
    // upserts below stay idempotent without it.
    if catalog::movie_exists(&job.db, &movie_id).await? {
        debug!(movie_id, "movie already in catalog; skipping enrichment");
        return Ok(());
    }

    let (primary_details, secondary_details, videos, credits) = tokio::join!(
        job.tmdb.movie_details(item.id, &cfg.primary_language),
        job.tmdb.movie_details(item.id, &cfg.secondary_language),
        job.tmdb.videos(item.id),
        job.tmdb.credits(item.id),
    );
    let primary_details = primary_details.context("primary-language details fetch failed")?;
    let secondary_details = secondary_details.context("secondary-language details fetch failed")?;
    let videos = videos.context("videos fetch failed")?;
    let credits = credits.context("credits fetch failed")?;

    let rating = resolve_rating(job, external_ids.imdb_id.as_deref()).await;

    catalog::ensure_movie(
        &job.db,
        &MovieUpsert {
            id: &movie_id,
            tmdb_id: item.id,
            rating: rating.rating,
            votes: rating.votes,
            release_date: parse_release_date(primary_details.release_date.as_deref()),
            original_language: primary_details.original_language.as_deref(),
        },
    )
    .await?;

    let primary = TranslationFields::from_details(&primary_details, &cfg.image_base_url);
    let secondary = secondary_fields(
        TranslationFields::from_details(&secondary_details, &cfg.image_base_url),
        &primary,
    );
    for (language, fields) in [
        (cfg.primary_language.as_str(), &primary),
        (cfg.secondary_language.as_str(), &secondary),
    ] {
        catalog::ensure_movie_translation(
            &job.db,
            &TranslationUpsert {
                entity_id: &movie_id,
                language,
                title: fields.title.as_deref(),
                original_title: fields.original_title.as_deref(),
                description: fields.description.as_deref(),
                poster_url: fields.poster_url.as_deref(),
            },
        )
        .await?;
    }

    catalog::bulk_upsert_trailers(&job.db, &trailer_rows(&movie_id, &videos)).await?;

    genres::process_genres(job, ctx, &movie_id, &primary_details.genres).await?;
    cast::process_cast(job, &movie_id, &credits).await?;

    let alert_title = primary
        .title
        .clone()
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    notify::evaluate_movie(job, &movie_id, &alert_title, rating.rating).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_id_prefers_cross_reference() {
        assert_eq!(canonical_movie_id(Some("tt0111161"), 278), "tt0111161");
        assert_eq!(canonical_movie_id(None, 42), "tmdb-42");
        assert_eq!(canonical_movie_id(Some(""), 42), "tmdb-42");
        assert_eq!(canonical_movie_id(Some("  "), 42), "tmdb-42");
    }

    #[test]
    fn secondary_falls_back_per_field() {
        let primary = TranslationFields {
            title: Some("The Shawshank Redemption".into()),
            original_title: Some("The Shawshank Redemption".into()),
            description: Some("Two imprisoned men...".into()),
            poster_url: Some("https://img/p.jpg".into()),
        };
        let secondary = secondary_fields(
            TranslationFields {
                title: Some("Die Verurteilten".into()),
                original_title: None,
                description: None,
                poster_url: None,
            },
            &primary,
        );
        assert_eq!(secondary.title.as_deref(), Some("Die Verurteilten"));
        assert_eq!(
            secondary.original_title.as_deref(),
            Some("The Shawshank Redemption")
        );
        assert_eq!(secondary.description.as_deref(), Some("Two imprisoned men..."));
        assert_eq!(secondary.poster_url.as_deref(), Some("https://img/p.jpg"));
    }

    #[test]
    fn secondary_title_falls_back_to_unknown_only() {
        let secondary = secondary_fields(TranslationFields::default(), &TranslationFields::default());
        assert_eq!(secondary.title.as_deref(), Some("Unknown"));
        assert_eq!(secondary.original_title, None);
        assert_eq!(secondary.description, None);
        assert_eq!(secondary.poster_url, None);
    }

    #[test]
    fn keeps_only_youtube_trailers() {
        let videos = vec![
            Video {
                key: "abc".into(),
                name: Some("Official Trailer".into()),
                site: "YouTube".into(),
                kind: "Trailer".into(),
            },
            Video {
                key: "def".into(),
                name: Some("Featurette".into()),
                site: "YouTube".into(),
                kind: "Featurette".into(),
            },
            Video {
                key: "ghi".into(),
                name: Some("Trailer elsewhere".into()),
                site: "Vimeo".into(),
                kind: "Trailer".into(),
            },
        ];
        let rows = trailer_rows("tt0111161", &videos);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].video_key, "abc");
        assert_eq!(rows[0].movie_id, "tt0111161");
    }

    #[test]
    fn release_date_tolerates_blank_and_garbage() {
        assert_eq!(
            parse_release_date(Some("1994-09-23")),
            NaiveDate::from_ymd_opt(1994, 9, 23)
        );
        assert_eq!(parse_release_date(Some("")), None);
        assert_eq!(parse_release_date(Some("soon")), None);
        assert_eq!(parse_release_date(None), None);
    }
}
