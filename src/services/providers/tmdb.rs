//! TMDB API provider
//!
//! Serves both title metadata and the episode catalog.
//!
//! API Flow:
//! 1. Metadata: /movie/{id} or /tv/{id}
//! 2. Season list: /tv/{id} → `seasons[]` (season 0 "Specials" is dropped)
//! 3. Episodes: /tv/{id}/season/{n} → `episodes[]`

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        EpisodeSummary, MediaKind, MediaSummary, SeasonSummary, TmdbMovie, TmdbSeason,
        TmdbSeasonDetails, TmdbShow,
    },
    services::providers::{EpisodeCatalog, MetadataProvider},
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
    catalog_ttl: u64,
}

impl TmdbClient {
    pub fn new(cache: Cache, api_key: String, api_url: String, catalog_ttl: u64) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
            catalog_ttl,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let response = self
            .http_client
            .get(self.url(path))
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                path = %path,
                status = %status,
                body = %body,
                "TMDB request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(path = %path, error = %e, "Failed to deserialize TMDB response");
            AppError::ExternalApi(format!("Failed to parse TMDB response: {}", e))
        })
    }
}

/// Drops specials and orders seasons ascending
fn regular_seasons(seasons: Vec<TmdbSeason>) -> Vec<SeasonSummary> {
    let mut regular: Vec<SeasonSummary> = seasons
        .into_iter()
        .filter(|s| s.season_number > 0)
        .map(SeasonSummary::from)
        .collect();
    regular.sort_by_key(|s| s.season_number);
    regular
}

#[async_trait::async_trait]
impl EpisodeCatalog for TmdbClient {
    async fn seasons(&self, series_id: &str) -> AppResult<Vec<SeasonSummary>> {
        cached!(
            self.cache,
            CacheKey::Seasons(series_id.to_string()),
            self.catalog_ttl,
            async move {
                let show: TmdbShow = self.get_json(&format!("tv/{}", series_id)).await?;
                let seasons = regular_seasons(show.seasons);

                tracing::info!(
                    series_id = %series_id,
                    seasons = seasons.len(),
                    provider = "tmdb",
                    "Season list fetched"
                );

                Ok::<_, AppError>(seasons)
            }
        )
    }

    async fn season_episodes(
        &self,
        series_id: &str,
        season_number: u32,
    ) -> AppResult<Vec<EpisodeSummary>> {
        cached!(
            self.cache,
            CacheKey::SeasonEpisodes(series_id.to_string(), season_number),
            self.catalog_ttl,
            async move {
                let details: TmdbSeasonDetails = self
                    .get_json(&format!("tv/{}/season/{}", series_id, season_number))
                    .await?;
                let episodes = details.into_episodes();

                tracing::info!(
                    series_id = %series_id,
                    season_number,
                    episodes = episodes.len(),
                    provider = "tmdb",
                    "Season episodes fetched"
                );

                Ok::<_, AppError>(episodes)
            }
        )
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbClient {
    async fn fetch_metadata(&self, kind: MediaKind, id: &str) -> AppResult<MediaSummary> {
        if id.trim().is_empty() {
            return Err(AppError::InvalidInput("Title id cannot be empty".to_string()));
        }

        let summary: MediaSummary = match kind {
            MediaKind::Movie => self
                .get_json::<TmdbMovie>(&format!("movie/{}", id))
                .await?
                .into(),
            MediaKind::Series => self
                .get_json::<TmdbShow>(&format!("tv/{}", id))
                .await?
                .into(),
        };

        tracing::debug!(kind = %kind, id = %id, title = %summary.title, "Metadata fetched");
        Ok(summary)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
