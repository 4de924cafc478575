//! Alert subscriptions and the notification ledger.
//!
//! The ledger is append-only: at most one row per (user, movie), ever. That
//! uniqueness is the sole guarantee preventing duplicate alerts, so the append
//! goes through `ON CONFLICT DO NOTHING` and reports whether the row was new.

use anyhow::Result;
use sqlx::Row;
use std::collections::HashSet;
use tracing::instrument;

use crate::database_ops::db::Db;

#[derive(Debug, Clone)]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    pub min_rating: f64,
    pub genre_id: Option<i64>,
    pub channel: String,
}

/// All subscriptions whose threshold is at or below the rating (inclusive
/// boundary: a threshold equal to the rating matches).
#[instrument(skip(db))]
pub async fn subscriptions_matching_rating(db: &Db, rating: f64) -> Result<Vec<Subscription>> {
    let rows = sqlx::query(
        "SELECT id, user_id, min_rating, genre_id, channel
         FROM subscriptions
         WHERE min_rating <= $1",
    )
    .bind(rating)
    .fetch_all(&db.pool)
    .await?;

    let mut subs = Vec::with_capacity(rows.len());
    for r in rows {
        subs.push(Subscription {
            id: r.get("id"),
            user_id: r.get("user_id"),
            min_rating: r.get("min_rating"),
            genre_id: r.get("genre_id"),
            channel: r.get("channel"),
        });
    }
    Ok(subs)
}

/// Users already notified for this movie.
pub async fn notified_user_ids(db: &Db, movie_id: &str) -> Result<HashSet<i64>> {
    let ids: Vec<i64> = sqlx::query_scalar("SELECT user_id FROM notifications WHERE movie_id = $1")
        .bind(movie_id)
        .fetch_all(&db.pool)
        .await?;
    Ok(ids.into_iter().collect())
}

/// Append a ledger row. Returns false when the pair already existed (another
/// run got there first); the caller must not dispatch in that case.
#[instrument(skip(db))]
pub async fn append_notification(db: &Db, user_id: i64, movie_id: &str) -> Result<bool> {
    let result = sqlx::query(
        "INSERT INTO notifications (user_id, movie_id) VALUES ($1, $2)
         ON CONFLICT (user_id, movie_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(movie_id)
    .execute(&db.pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
