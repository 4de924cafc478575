//! Cast fan-out: the dominant rate-limit and connection-pool pressure in a
//! refresh. Each actor costs ~5 downstream calls (2 detail fetches, 2
//! translation upserts, 1 link upsert), so the cast list is capped to the top
//! N by source order and processed near-serially with a fixed inter-item
//! pause.

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use itertools::Itertools;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{instrument, warn};

use crate::database_ops::catalog::{self, TranslationUpsert};
use crate::database_ops::tmdb::provider::CastMember;
use crate::refresh::movie::{poster_url, secondary_fields, TranslationFields};
use crate::refresh::RefreshJob;

/// Canonical actor key: cross-reference id if present, else a deterministic
/// synthetic key from the source's person id.
pub fn canonical_actor_id(imdb_id: Option<&str>, tmdb_id: i64) -> String {
    match imdb_id.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => format!("tmdb-person-{tmdb_id}"),
    }
}

/// Top N entries by the source-provided order; unordered entries sort last.
pub(crate) fn capped_cast(cast: &[CastMember], limit: usize) -> Vec<CastMember> {
    cast.iter()
        .cloned()
        .sorted_by_key(|m| m.order.unwrap_or(i64::MAX))
        .take(limit)
        .collect()
}

#[instrument(skip(job, cast), fields(cast_count = cast.len()))]
pub async fn process_cast(job: &RefreshJob, movie_id: &str, cast: &[CastMember]) -> Result<()> {
    let cfg = &job.config;
    let capped = capped_cast(cast, cfg.cast_limit);
    if capped.is_empty() {
        return Ok(());
    }

    let sem = Arc::new(Semaphore::new(cfg.actor_concurrency.max(1)));
    let delay = Duration::from_millis(cfg.actor_delay_ms);

    let mut tasks = FuturesUnordered::new();
    for member in capped {
        let sem = sem.clone();
        tasks.push(async move {
            let _permit = sem.acquire().await.ok();
            let result = process_actor(job, movie_id, &member).await;
            // Hold the permit through the pause so starts stay spaced out.
            tokio::time::sleep(delay).await;
            (member.id, result)
        });
    }

    while let Some((person_id, result)) = tasks.next().await {
        if let Err(err) = result {
            warn!(movie_id, person_id, error = %err, "actor processing failed; siblings continue");
        }
    }
    Ok(())
}

async fn process_actor(job: &RefreshJob, movie_id: &str, member: &CastMember) -> Result<()> {
    let cfg = &job.config;

    let (primary_person, secondary_person) = tokio::join!(
        job.tmdb.person_details(member.id, &cfg.primary_language),
        job.tmdb.person_details(member.id, &cfg.secondary_language),
    );
    let primary_person = primary_person.context("primary-language person fetch failed")?;
    let secondary_person = match secondary_person {
        Ok(person) => person,
        Err(err) => {
            warn!(person_id = member.id, error = %err, "secondary-language person fetch failed; reusing primary fields");
            Default::default()
        }
    };

    let actor_id = canonical_actor_id(primary_person.imdb_id.as_deref(), member.id);
    catalog::ensure_actor(&job.db, &actor_id, member.id).await?;

    let primary = TranslationFields {
        title: primary_person.name.clone(),
        original_title: None,
        description: primary_person.biography.clone(),
        poster_url: poster_url(primary_person.profile_path.as_deref(), &cfg.image_base_url),
    };
    let secondary = secondary_fields(
        TranslationFields {
            title: secondary_person.name.clone(),
            original_title: None,
            description: secondary_person.biography.clone(),
            poster_url: poster_url(secondary_person.profile_path.as_deref(), &cfg.image_base_url),
        },
        &primary,
    );
    for (language, fields) in [
        (cfg.primary_language.as_str(), &primary),
        (cfg.secondary_language.as_str(), &secondary),
    ] {
        catalog::ensure_actor_translation(
            &job.db,
            &TranslationUpsert {
                entity_id: &actor_id,
                language,
                title: fields.title.as_deref(),
                original_title: fields.original_title.as_deref(),
                description: fields.description.as_deref(),
                poster_url: fields.poster_url.as_deref(),
            },
        )
        .await?;
    }

    catalog::ensure_cast_link(
        &job.db,
        movie_id,
        &actor_id,
        member.character.as_deref(),
        member.order,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: i64, order: Option<i64>) -> CastMember {
        CastMember {
            id,
            character: None,
            order,
        }
    }

    #[test]
    fn canonical_actor_id_prefers_cross_reference() {
        assert_eq!(canonical_actor_id(Some("nm0000209"), 504), "nm0000209");
        assert_eq!(canonical_actor_id(None, 504), "tmdb-person-504");
        assert_eq!(canonical_actor_id(Some(" "), 504), "tmdb-person-504");
    }

    #[test]
    fn cap_respects_source_order() {
        let cast = vec![
            member(3, Some(2)),
            member(1, Some(0)),
            member(4, None),
            member(2, Some(1)),
        ];
        let capped = capped_cast(&cast, 2);
        let ids: Vec<i64> = capped.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn cap_larger_than_list_keeps_everything() {
        let cast = vec![member(1, Some(0)), member(2, Some(1))];
        assert_eq!(capped_cast(&cast, 10).len(), 2);
    }
}
