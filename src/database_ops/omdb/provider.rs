use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::normalization::rating::PrimaryRating;

/// Primary rating provider client (OMDb API shape).
///
/// Lookup is by IMDb id: GET /?i=tt0111161. Rating and vote fields arrive as
/// strings with an "N/A" sentinel and thousands separators; parsing lives in
/// `normalization::rating`, this client only fetches the raw payload.
#[derive(Debug, Clone)]
pub struct OmdbProvider {
    base_url: String,
    http: Client,
    api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OmdbTitle {
    #[serde(rename = "imdbRating")]
    pub imdb_rating: Option<String>,
    #[serde(rename = "imdbVotes")]
    pub imdb_votes: Option<String>,
    #[serde(rename = "Response")]
    pub response: Option<String>,
}

impl OmdbTitle {
    /// The provider reports misses as 200 + `"Response": "False"`.
    pub fn is_found(&self) -> bool {
        !matches!(self.response.as_deref(), Some("False"))
    }

    pub fn into_primary_rating(self) -> PrimaryRating {
        PrimaryRating {
            rating: self.imdb_rating,
            votes: self.imdb_votes,
        }
    }
}

impl OmdbProvider {
    pub fn new(base_url: Option<&str>, timeout_secs: Option<u64>) -> Result<Self> {
        let base_url = base_url
            .unwrap_or(crate::config::DEFAULT_OMDB_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let timeout_secs = timeout_secs.unwrap_or(15);
        let http = Client::builder()
            .user_agent("ReelwatchCatalog/1.0")
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            http,
            api_key: None,
        })
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|s| !s.trim().is_empty());
        self
    }

    pub async fn title_by_imdb_id(&self, imdb_id: &str) -> Result<Option<OmdbTitle>> {
        let mut req = self.http.get(&self.base_url).query(&[("i", imdb_id)]);
        if let Some(key) = self.api_key.as_deref() {
            req = req.query(&[("apikey", key)]);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("rating provider returned {status} for {imdb_id}"));
        }
        let title = resp.json::<OmdbTitle>().await?;
        Ok(title.is_found().then_some(title))
    }
}
