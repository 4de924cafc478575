//! Catalog store upserts.
//!
//! Every writer here is idempotent: entities are created on first sighting and
//! updated in place on every later refresh, keyed by their canonical id or a
//! unique pair. Nothing in this module deletes catalog entities; the one
//! destructive operation is `replace_movie_genres`, which reconciles a movie's
//! genre link SET to the latest payload.

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::QueryBuilder;
use tracing::instrument;

use crate::database_ops::db::Db;

#[derive(Debug, Clone)]
pub struct MovieUpsert<'a> {
    pub id: &'a str,
    pub tmdb_id: i64,
    pub rating: Option<f64>,
    pub votes: Option<i64>,
    pub release_date: Option<NaiveDate>,
    pub original_language: Option<&'a str>,
}

/// Localized field set, shared by movies and actors.
#[derive(Debug, Clone)]
pub struct TranslationUpsert<'a> {
    pub entity_id: &'a str,
    pub language: &'a str,
    pub title: Option<&'a str>,
    pub original_title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub poster_url: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct TrailerRow {
    pub movie_id: String,
    pub video_key: String,
    pub name: Option<String>,
}

#[instrument(skip(db, movie), fields(movie_id = movie.id))]
pub async fn ensure_movie(db: &Db, movie: &MovieUpsert<'_>) -> Result<()> {
    sqlx::query(
        "INSERT INTO movies (id, tmdb_id, rating, votes, release_date, original_language)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (id) DO UPDATE
            SET tmdb_id = EXCLUDED.tmdb_id,
                rating = EXCLUDED.rating,
                votes = EXCLUDED.votes,
                release_date = EXCLUDED.release_date,
                original_language = EXCLUDED.original_language,
                updated_at = now()",
    )
    .bind(movie.id)
    .bind(movie.tmdb_id)
    .bind(movie.rating)
    .bind(movie.votes)
    .bind(movie.release_date)
    .bind(movie.original_language)
    .execute(&db.pool)
    .await?;
    Ok(())
}

pub async fn movie_exists(db: &Db, movie_id: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM movies WHERE id = $1)")
        .bind(movie_id)
        .fetch_one(&db.pool)
        .await?;
    Ok(exists)
}

#[instrument(skip(db, tr), fields(entity_id = tr.entity_id, language = tr.language))]
pub async fn ensure_movie_translation(db: &Db, tr: &TranslationUpsert<'_>) -> Result<()> {
    upsert_translation(db, "movie_translations", "movie_id", tr).await
}

#[instrument(skip(db, tr), fields(entity_id = tr.entity_id, language = tr.language))]
pub async fn ensure_actor_translation(db: &Db, tr: &TranslationUpsert<'_>) -> Result<()> {
    upsert_translation(db, "actor_translations", "actor_id", tr).await
}

async fn upsert_translation(
    db: &Db,
    table: &str,
    fk_column: &str,
    tr: &TranslationUpsert<'_>,
) -> Result<()> {
    // Table/column names come from the two callers above, never from input.
    let sql = format!(
        "INSERT INTO {table} ({fk_column}, language, title, original_title, description, poster_url)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT ({fk_column}, language) DO UPDATE
            SET title = EXCLUDED.title,
                original_title = EXCLUDED.original_title,
                description = EXCLUDED.description,
                poster_url = EXCLUDED.poster_url"
    );
    sqlx::query(&sql)
        .bind(tr.entity_id)
        .bind(tr.language)
        .bind(tr.title)
        .bind(tr.original_title)
        .bind(tr.description)
        .bind(tr.poster_url)
        .execute(&db.pool)
        .await?;
    Ok(())
}

/// Base genre row. Duplicate-insert races between concurrent runs land on the
/// conflict arm and count as success.
pub async fn ensure_genre(db: &Db, genre_id: i64) -> Result<()> {
    sqlx::query("INSERT INTO genres (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(genre_id)
        .execute(&db.pool)
        .await?;
    Ok(())
}

pub async fn ensure_genre_translation(
    db: &Db,
    genre_id: i64,
    language: &str,
    name: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO genre_translations (genre_id, language, name)
         VALUES ($1, $2, $3)
         ON CONFLICT (genre_id, language) DO UPDATE SET name = EXCLUDED.name",
    )
    .bind(genre_id)
    .bind(language)
    .bind(name)
    .execute(&db.pool)
    .await?;
    Ok(())
}

/// Replace the movie's genre-association set to exactly `genre_ids`.
/// Genres absent from the latest payload are unlinked, not left alone.
#[instrument(skip(db, genre_ids))]
pub async fn replace_movie_genres(db: &Db, movie_id: &str, genre_ids: &[i64]) -> Result<()> {
    sqlx::query("DELETE FROM movie_genres WHERE movie_id = $1 AND genre_id <> ALL($2)")
        .bind(movie_id)
        .bind(genre_ids)
        .execute(&db.pool)
        .await?;
    if genre_ids.is_empty() {
        return Ok(());
    }
    let mut qb: QueryBuilder<'_, sqlx::Postgres> =
        QueryBuilder::new("INSERT INTO movie_genres (movie_id, genre_id) ");
    qb.push_values(genre_ids, |mut b, genre_id| {
        b.push_bind(movie_id).push_bind(genre_id);
    });
    qb.push(" ON CONFLICT (movie_id, genre_id) DO NOTHING");
    qb.build().execute(&db.pool).await?;
    Ok(())
}

pub async fn movie_genre_ids(db: &Db, movie_id: &str) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar("SELECT genre_id FROM movie_genres WHERE movie_id = $1")
        .bind(movie_id)
        .fetch_all(&db.pool)
        .await?;
    Ok(ids)
}

#[instrument(skip(db, rows))]
pub async fn bulk_upsert_trailers(db: &Db, rows: &[TrailerRow]) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    let mut qb: QueryBuilder<'_, sqlx::Postgres> =
        QueryBuilder::new("INSERT INTO trailers (movie_id, video_key, name) ");
    qb.push_values(rows, |mut b, r| {
        b.push_bind(&r.movie_id)
            .push_bind(&r.video_key)
            .push_bind(&r.name);
    });
    qb.push(" ON CONFLICT (movie_id, video_key) DO UPDATE SET name = EXCLUDED.name");
    qb.build().execute(&db.pool).await?;
    Ok(())
}

#[instrument(skip(db))]
pub async fn ensure_actor(db: &Db, actor_id: &str, tmdb_id: i64) -> Result<()> {
    sqlx::query(
        "INSERT INTO actors (id, tmdb_id) VALUES ($1, $2)
         ON CONFLICT (id) DO UPDATE SET tmdb_id = EXCLUDED.tmdb_id, updated_at = now()",
    )
    .bind(actor_id)
    .bind(tmdb_id)
    .execute(&db.pool)
    .await?;
    Ok(())
}

/// (movie, actor) link carrying character/order metadata; updated in place on
/// re-link.
#[instrument(skip(db, character))]
pub async fn ensure_cast_link(
    db: &Db,
    movie_id: &str,
    actor_id: &str,
    character: Option<&str>,
    cast_order: Option<i64>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO cast_links (movie_id, actor_id, character, cast_order)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (movie_id, actor_id) DO UPDATE
            SET character = EXCLUDED.character,
                cast_order = EXCLUDED.cast_order",
    )
    .bind(movie_id)
    .bind(actor_id)
    .bind(character)
    .bind(cast_order)
    .execute(&db.pool)
    .await?;
    Ok(())
}
