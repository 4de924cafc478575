//! Rating reconciliation: merge two providers into one authoritative
//! (rating, votes) pair.
//!
//! The primary provider encodes both fields as strings with an "N/A" sentinel
//! and thousands separators; the fallback provider exposes a structured
//! numeric aggregate. The primary wins only when BOTH of its fields parse.

const SENTINEL: &str = "N/A";

/// Raw string-encoded fields from the primary rating provider.
#[derive(Debug, Clone, Default)]
pub struct PrimaryRating {
    pub rating: Option<String>,
    pub votes: Option<String>,
}

/// Structured aggregate from the fallback provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackRating {
    pub rating: Option<f64>,
    pub votes: Option<i64>,
}

/// The merged result. `(None, None)` is a valid outcome, not an error: the
/// movie is persisted ratingless.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReconciledRating {
    pub rating: Option<f64>,
    pub votes: Option<i64>,
}

/// Parse a provider rating string. Sentinel and empty input yield None.
pub fn parse_rating(raw: &str) -> Option<f64> {
    let cleaned = clean_numeric(raw)?;
    cleaned.parse::<f64>().ok()
}

/// Parse a provider vote-count string, stripping thousands separators first.
pub fn parse_votes(raw: &str) -> Option<i64> {
    let cleaned = clean_numeric(raw)?;
    cleaned.parse::<i64>().ok()
}

fn clean_numeric(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == SENTINEL {
        return None;
    }
    Some(trimmed.replace(',', ""))
}

impl PrimaryRating {
    /// Both fields present, non-sentinel, and parseable.
    pub fn parse(&self) -> Option<ReconciledRating> {
        let rating = parse_rating(self.rating.as_deref()?)?;
        let votes = parse_votes(self.votes.as_deref()?)?;
        Some(ReconciledRating {
            rating: Some(rating),
            votes: Some(votes),
        })
    }
}

/// Apply the fallback policy: primary when complete, else the fallback
/// aggregate, else ratingless.
pub fn reconcile(
    primary: Option<&PrimaryRating>,
    fallback: Option<&FallbackRating>,
) -> ReconciledRating {
    if let Some(parsed) = primary.and_then(PrimaryRating::parse) {
        return parsed;
    }
    match fallback {
        Some(fb) => ReconciledRating {
            rating: fb.rating,
            votes: fb.votes,
        },
        None => ReconciledRating::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primary(rating: &str, votes: &str) -> PrimaryRating {
        PrimaryRating {
            rating: Some(rating.to_string()),
            votes: Some(votes.to_string()),
        }
    }

    #[test]
    fn parses_plain_and_separated_numbers() {
        assert_eq!(parse_rating("9.3"), Some(9.3));
        assert_eq!(parse_votes("2,700,000"), Some(2_700_000));
        assert_eq!(parse_votes("512"), Some(512));
    }

    #[test]
    fn rejects_sentinel_and_empty() {
        assert_eq!(parse_rating("N/A"), None);
        assert_eq!(parse_rating(""), None);
        assert_eq!(parse_votes("N/A"), None);
        assert_eq!(parse_votes("  "), None);
    }

    #[test]
    fn complete_primary_is_authoritative() {
        let merged = reconcile(
            Some(&primary("9.3", "2,700,000")),
            Some(&FallbackRating {
                rating: Some(8.7),
                votes: Some(24_000),
            }),
        );
        assert_eq!(merged.rating, Some(9.3));
        assert_eq!(merged.votes, Some(2_700_000));
    }

    #[test]
    fn partial_primary_falls_back() {
        let merged = reconcile(
            Some(&primary("8.1", "N/A")),
            Some(&FallbackRating {
                rating: Some(7.9),
                votes: Some(1_200),
            }),
        );
        assert_eq!(merged.rating, Some(7.9));
        assert_eq!(merged.votes, Some(1_200));
    }

    #[test]
    fn missing_both_sources_yields_ratingless() {
        assert_eq!(reconcile(None, None), ReconciledRating::default());
        let merged = reconcile(Some(&primary("N/A", "N/A")), None);
        assert_eq!(merged, ReconciledRating::default());
    }

    #[test]
    fn empty_fallback_fields_pass_through_as_none() {
        let merged = reconcile(Some(&primary("", "")), Some(&FallbackRating::default()));
        assert_eq!(merged, ReconciledRating::default());
    }
}
