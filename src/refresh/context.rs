//! Per-run state, passed explicitly through the pipeline call chain so runs
//! stay reentrant and unit-testable.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Run-scoped caches. The genre dedup set is a pure optimization: correctness
/// comes from upsert idempotency at the store, so losing an entry (or two
/// overlapping runs) only costs redundant remote calls.
pub struct RunContext {
    processed_genres: Mutex<HashSet<i64>>,
    secondary_genre_names: HashMap<i64, String>,
}

impl RunContext {
    /// `secondary_genre_names` is fetched once from the catalog source's
    /// genre-list endpoint at run start; missing entries fall back to the
    /// primary-language name downstream.
    pub fn new(secondary_genre_names: HashMap<i64, String>) -> Self {
        Self {
            processed_genres: Mutex::new(HashSet::new()),
            secondary_genre_names,
        }
    }

    pub fn genre_processed(&self, genre_id: i64) -> bool {
        self.processed_genres
            .lock()
            .expect("genre cache lock poisoned")
            .contains(&genre_id)
    }

    pub fn mark_genre_processed(&self, genre_id: i64) {
        self.processed_genres
            .lock()
            .expect("genre cache lock poisoned")
            .insert(genre_id);
    }

    pub fn secondary_genre_name(&self, genre_id: i64) -> Option<&str> {
        self.secondary_genre_names.get(&genre_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_set_marks_once() {
        let ctx = RunContext::new(HashMap::new());
        assert!(!ctx.genre_processed(28));
        ctx.mark_genre_processed(28);
        assert!(ctx.genre_processed(28));
        assert!(!ctx.genre_processed(12));
    }

    #[test]
    fn secondary_names_resolve_or_miss() {
        let ctx = RunContext::new(HashMap::from([(28, "Action".to_string())]));
        assert_eq!(ctx.secondary_genre_name(28), Some("Action"));
        assert_eq!(ctx.secondary_genre_name(12), None);
    }
}
