use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Catalog source client (TMDB v3 API shape).
///
/// Key endpoints:
/// - GET /movie/now_playing?region=..&language=.. - current listing
/// - GET /movie/{id}?language=..                  - localized details
/// - GET /movie/{id}/external_ids                 - cross-reference ids
/// - GET /movie/{id}/videos                       - trailers etc.
/// - GET /movie/{id}/credits                      - ordered cast list
/// - GET /genre/movie/list?language=..            - genre id/name mapping
/// - GET /person/{id}?language=..                 - actor details
/// - GET /find/{imdb_id}?external_source=imdb_id  - fallback rating aggregate
#[derive(Debug, Clone)]
pub struct TmdbProvider {
    base_url: String,
    http: Client,
    api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingMovie {
    pub id: i64,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GenreRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct MovieDetails {
    pub id: i64,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub original_language: Option<String>,
    #[serde(default)]
    pub genres: Vec<GenreRef>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExternalIds {
    pub imdb_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    pub key: String,
    pub name: Option<String>,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CastMember {
    pub id: i64,
    pub character: Option<String>,
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PersonDetails {
    pub id: i64,
    pub name: Option<String>,
    pub biography: Option<String>,
    pub profile_path: Option<String>,
    pub imdb_id: Option<String>,
}

/// Structured rating aggregate used as the fallback rating source.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct RatingAggregate {
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Paged<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct GenreListResponse {
    #[serde(default)]
    genres: Vec<GenreRef>,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    movie_results: Vec<RatingAggregate>,
}

impl TmdbProvider {
    pub fn new(base_url: Option<&str>, timeout_secs: Option<u64>) -> Result<Self> {
        let base_url = base_url
            .unwrap_or(crate::config::DEFAULT_TMDB_BASE_URL)
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

    fn add_auth_query(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key.as_deref() {
            Some(key) => req.query(&[("api_key", key)]),
            None => req,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let req = self.add_auth_query(self.http.get(&url)).query(query);
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("catalog source {path} returned {status}"));
        }
        Ok(resp.json::<T>().await?)
    }

    /// First page of the now-playing listing for a region/language.
    pub async fn now_playing(&self, region: &str, language: &str) -> Result<Vec<ListingMovie>> {
        let page: Paged<ListingMovie> = self
            .get_json(
                "/movie/now_playing",
                &[("region", region), ("language", language), ("page", "1")],
            )
            .await?;
        Ok(page.results)
    }

    pub async fn movie_details(&self, movie_id: i64, language: &str) -> Result<MovieDetails> {
        self.get_json(&format!("/movie/{movie_id}"), &[("language", language)])
            .await
    }

    pub async fn external_ids(&self, movie_id: i64) -> Result<ExternalIds> {
        self.get_json(&format!("/movie/{movie_id}/external_ids"), &[])
            .await
    }

    pub async fn videos(&self, movie_id: i64) -> Result<Vec<Video>> {
        let page: Paged<Video> = self.get_json(&format!("/movie/{movie_id}/videos"), &[]).await?;
        Ok(page.results)
    }

    pub async fn credits(&self, movie_id: i64) -> Result<Vec<CastMember>> {
        #[derive(Deserialize)]
        struct Credits {
            #[serde(default)]
            cast: Vec<CastMember>,
        }
        let credits: Credits = self
            .get_json(&format!("/movie/{movie_id}/credits"), &[])
            .await?;
        Ok(credits.cast)
    }

    pub async fn genre_list(&self, language: &str) -> Result<Vec<GenreRef>> {
        let resp: GenreListResponse = self
            .get_json("/genre/movie/list", &[("language", language)])
            .await?;
        Ok(resp.genres)
    }

    pub async fn person_details(&self, person_id: i64, language: &str) -> Result<PersonDetails> {
        self.get_json(&format!("/person/{person_id}"), &[("language", language)])
            .await
    }

    /// Fallback rating aggregate, looked up by the cross-reference (IMDb) id.
    pub async fn rating_by_imdb_id(&self, imdb_id: &str) -> Result<Option<RatingAggregate>> {
        let resp: FindResponse = self
            .get_json(
                &format!("/find/{imdb_id}"),
                &[("external_source", "imdb_id")],
            )
            .await?;
        Ok(resp.movie_results.into_iter().next())
    }
}
