use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use dashmap::DashMap;

use crate::{
    error::{AppError, AppResult},
    models::{EpisodeSummary, SeasonEpisodeCount, SeasonSummary},
    services::providers::EpisodeCatalog,
};

/// Episode catalog backed by a fixed season table, for tests and offline runs
#[derive(Debug, Default)]
pub struct StaticCatalog {
    series: DashMap<String, Vec<SeasonEpisodeCount>>,
    unavailable: AtomicBool,
    calls: AtomicUsize,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a series as `(season_number, episode_count)` pairs
    pub fn with_series(self, series_id: &str, seasons: &[(u32, u32)]) -> Self {
        self.set_series(series_id, seasons);
        self
    }

    pub fn set_series(&self, series_id: &str, seasons: &[(u32, u32)]) {
        let table = seasons
            .iter()
            .map(|&(season, count)| SeasonEpisodeCount::new(season, count))
            .collect();
        self.series.insert(series_id.to_string(), table);
    }

    /// Makes every call fail as if upstream were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of upstream calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn table(&self, series_id: &str) -> AppResult<Vec<SeasonEpisodeCount>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::ExternalApi("episode catalog unavailable".to_string()));
        }
        self.series
            .get(series_id)
            .map(|table| table.clone())
            .ok_or_else(|| AppError::ExternalApi(format!("series {} not in catalog", series_id)))
    }
}

#[async_trait::async_trait]
impl EpisodeCatalog for StaticCatalog {
    async fn seasons(&self, series_id: &str) -> AppResult<Vec<SeasonSummary>> {
        Ok(self
            .table(series_id)?
            .into_iter()
            .map(|s| SeasonSummary {
                season_number: s.season_number,
                name: None,
                episode_count: Some(s.episode_count),
            })
            .collect())
    }

    async fn season_episodes(
        &self,
        series_id: &str,
        season_number: u32,
    ) -> AppResult<Vec<EpisodeSummary>> {
        let season = self
            .table(series_id)?
            .into_iter()
            .find(|s| s.season_number == season_number)
            .ok_or_else(|| {
                AppError::ExternalApi(format!(
                    "season {} of series {} not in catalog",
                    season_number, series_id
                ))
            })?;

        Ok((1..=season.episode_count)
            .map(|episode_number| EpisodeSummary {
                season_number,
                episode_number,
                name: None,
            })
            .collect())
    }
}
