//! Genre normalization: idempotent genre + translation upserts behind the
//! run-scoped dedup set, then replacement of the movie's genre link set.

use anyhow::Result;
use tracing::instrument;

use crate::database_ops::catalog;
use crate::database_ops::tmdb::provider::GenreRef;
use crate::refresh::context::RunContext;
use crate::refresh::RefreshJob;

#[instrument(skip(job, ctx, genres), fields(genre_count = genres.len()))]
pub async fn process_genres(
    job: &RefreshJob,
    ctx: &RunContext,
    movie_id: &str,
    genres: &[GenreRef],
) -> Result<()> {
    let cfg = &job.config;

    for genre in genres {
        // Already handled earlier this run; link replacement below still
        // sees the id.
        if ctx.genre_processed(genre.id) {
            continue;
        }

        catalog::ensure_genre(&job.db, genre.id).await?;
        catalog::ensure_genre_translation(&job.db, genre.id, &cfg.primary_language, &genre.name)
            .await?;
        let secondary_name = ctx
            .secondary_genre_name(genre.id)
            .unwrap_or(genre.name.as_str());
        catalog::ensure_genre_translation(
            &job.db,
            genre.id,
            &cfg.secondary_language,
            secondary_name,
        )
        .await?;

        ctx.mark_genre_processed(genre.id);
    }

    let genre_ids: Vec<i64> = genres.iter().map(|g| g.id).collect();
    catalog::replace_movie_genres(&job.db, movie_id, &genre_ids).await
}
