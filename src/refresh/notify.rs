//! Notification matching: evaluate subscriptions against a newly-rated movie,
//! dispatch through the notifier collaborator, and maintain the append-only
//! dedup ledger.
//!
//! Delivery is fire-and-forget: the ledger row is appended regardless of
//! dispatch outcome, so a failed delivery is logged and never retried.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::database_ops::alerts::{self, Subscription};
use crate::database_ops::catalog;
use crate::refresh::RefreshJob;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieAlert {
    pub id: String,
    pub title: String,
    pub rating: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub user_id: i64,
    pub channel: String,
    pub movie: MovieAlert,
}

/// External notifier collaborator. A trait seam so tests can inject a
/// recording fake.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn dispatch(&self, payload: &NotificationPayload) -> Result<()>;
}

/// POSTs each payload to a webhook.
pub struct WebhookNotifier {
    url: String,
    http: Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent("ReelwatchNotifier/1.0")
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn dispatch(&self, payload: &NotificationPayload) -> Result<()> {
        let resp = self.http.post(&self.url).json(payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("notifier returned {status}"));
        }
        Ok(())
    }
}

/// Stand-in when no webhook is configured; alerts only reach the logs.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn dispatch(&self, payload: &NotificationPayload) -> Result<()> {
        info!(
            user_id = payload.user_id,
            channel = %payload.channel,
            movie_id = %payload.movie.id,
            rating = payload.movie.rating,
            "notification (no webhook configured)"
        );
        Ok(())
    }
}

/// Pure matching step: which subscriptions get an alert for this movie.
/// Inputs are the threshold-filtered subscription list, the ledger snapshot
/// for the movie, and the movie's current genre links. A user with several
/// qualifying subscriptions is alerted once.
pub fn plan_notifications<'a>(
    subscriptions: &'a [Subscription],
    rating: f64,
    already_notified: &HashSet<i64>,
    movie_genres: &[i64],
) -> Vec<&'a Subscription> {
    let mut planned_users: HashSet<i64> = HashSet::new();
    subscriptions
        .iter()
        .filter(|sub| sub.min_rating <= rating)
        .filter(|sub| !already_notified.contains(&sub.user_id))
        .filter(|sub| match sub.genre_id {
            Some(genre_id) => movie_genres.contains(&genre_id),
            None => true,
        })
        .filter(|sub| planned_users.insert(sub.user_id))
        .collect()
}

/// Evaluate and dispatch alerts for one movie. A null rating short-circuits
/// the whole component. Returns the number of dispatch attempts.
#[instrument(skip(job, title, rating))]
pub async fn evaluate_movie(
    job: &RefreshJob,
    movie_id: &str,
    title: &str,
    rating: Option<f64>,
) -> Result<usize> {
    let Some(rating) = rating else {
        debug!(movie_id, "no rating; skipping notification evaluation");
        return Ok(0);
    };

    let subscriptions = alerts::subscriptions_matching_rating(&job.db, rating).await?;
    if subscriptions.is_empty() {
        return Ok(0);
    }
    let movie_genres = catalog::movie_genre_ids(&job.db, movie_id).await?;
    let already_notified = alerts::notified_user_ids(&job.db, movie_id).await?;

    let planned = plan_notifications(&subscriptions, rating, &already_notified, &movie_genres);
    let mut dispatched = 0usize;
    for sub in planned {
        let payload = NotificationPayload {
            user_id: sub.user_id,
            channel: sub.channel.clone(),
            movie: MovieAlert {
                id: movie_id.to_string(),
                title: title.to_string(),
                rating,
            },
        };
        if let Err(err) = job.notifier.dispatch(&payload).await {
            warn!(user_id = sub.user_id, movie_id, error = %err, "notifier dispatch failed");
        }
        // Appended regardless of dispatch outcome; the unique pair is what
        // prevents a second alert on the next run.
        let appended = alerts::append_notification(&job.db, sub.user_id, movie_id).await?;
        if !appended {
            debug!(user_id = sub.user_id, movie_id, "ledger row already present");
        }
        dispatched += 1;
    }
    if dispatched > 0 {
        info!(movie_id, rating, dispatched, "alerts dispatched");
    }
    Ok(dispatched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(id: i64, user_id: i64, min_rating: f64, genre_id: Option<i64>) -> Subscription {
        Subscription {
            id,
            user_id,
            min_rating,
            genre_id,
            channel: "email".to_string(),
        }
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        let subs = vec![
            sub(1, 10, 8.0, None),
            sub(2, 20, 8.5, None),
            sub(3, 30, 8.6, None),
        ];
        let planned = plan_notifications(&subs, 8.5, &HashSet::new(), &[]);
        let users: Vec<i64> = planned.iter().map(|s| s.user_id).collect();
        assert_eq!(users, vec![10, 20]);
    }

    #[test]
    fn ledger_hits_are_skipped() {
        let subs = vec![sub(1, 10, 8.0, None), sub(2, 20, 7.5, None)];
        let already: HashSet<i64> = HashSet::from([10]);
        let planned = plan_notifications(&subs, 9.0, &already, &[]);
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].user_id, 20);
    }

    #[test]
    fn genre_filter_must_match_current_links() {
        let subs = vec![sub(1, 10, 8.0, Some(28)), sub(2, 20, 8.0, Some(12))];
        let planned = plan_notifications(&subs, 9.0, &HashSet::new(), &[28, 35]);
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].user_id, 10);
    }

    #[test]
    fn user_with_multiple_matching_subscriptions_alerted_once() {
        let subs = vec![sub(1, 10, 8.0, None), sub(2, 10, 7.0, None)];
        let planned = plan_notifications(&subs, 9.0, &HashSet::new(), &[]);
        assert_eq!(planned.len(), 1);
    }

    #[test]
    fn payload_shape_matches_notifier_contract() {
        let payload = NotificationPayload {
            user_id: 7,
            channel: "push".to_string(),
            movie: MovieAlert {
                id: "tt0111161".to_string(),
                title: "The Shawshank Redemption".to_string(),
                rating: 9.3,
            },
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["userId"], 7);
        assert_eq!(value["channel"], "push");
        assert_eq!(value["movie"]["id"], "tt0111161");
        assert_eq!(value["movie"]["rating"], 9.3);
    }
}
