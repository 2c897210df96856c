use std::sync::Arc;

use crate::{
    error::AppResult,
    models::SeasonEpisodeCount,
    services::{locks::KeyedLocks, providers::EpisodeCatalog},
};

/// Sequential access to the episode catalog.
///
/// The upstream catalog is rate limited, so at most one walk per series runs
/// at a time and seasons are fetched one after another, never concurrently.
/// Errors are returned as-is; callers decide whether they are fatal.
#[derive(Clone)]
pub struct CatalogGate {
    catalog: Arc<dyn EpisodeCatalog>,
    gates: KeyedLocks,
}

impl CatalogGate {
    pub fn new(catalog: Arc<dyn EpisodeCatalog>) -> Self {
        Self {
            catalog,
            gates: KeyedLocks::new(),
        }
    }

    /// Episode count of every season, from each season's episode list
    pub async fn season_table(&self, series_id: &str) -> AppResult<Vec<SeasonEpisodeCount>> {
        let _gate = self.gates.lock(series_id).await;

        let seasons = self.catalog.seasons(series_id).await?;
        let mut table = Vec::with_capacity(seasons.len());
        for season in seasons {
            let episodes = self
                .catalog
                .season_episodes(series_id, season.season_number)
                .await?;
            table.push(SeasonEpisodeCount::new(
                season.season_number,
                u32::try_from(episodes.len()).unwrap_or(u32::MAX),
            ));
        }

        tracing::debug!(
            series_id = %series_id,
            seasons = table.len(),
            "Walked episode catalog"
        );

        Ok(table)
    }

    /// Episode numbers of one season
    pub async fn season_episode_numbers(
        &self,
        series_id: &str,
        season_number: u32,
    ) -> AppResult<Vec<u32>> {
        let _gate = self.gates.lock(series_id).await;

        let episodes = self
            .catalog
            .season_episodes(series_id, season_number)
            .await?;
        Ok(episodes.into_iter().map(|e| e.episode_number).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{EpisodeSummary, SeasonSummary};
    use crate::services::providers::MockEpisodeCatalog;
    use std::sync::Mutex;

    fn season(n: u32) -> SeasonSummary {
        SeasonSummary {
            season_number: n,
            name: None,
            episode_count: None,
        }
    }

    fn episodes(season_number: u32, count: u32) -> Vec<EpisodeSummary> {
        (1..=count)
            .map(|episode_number| EpisodeSummary {
                season_number,
                episode_number,
                name: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_season_table_walks_seasons_in_order() {
        let fetched = Arc::new(Mutex::new(Vec::new()));
        let log = fetched.clone();

        let mut catalog = MockEpisodeCatalog::new();
        catalog
            .expect_seasons()
            .times(1)
            .returning(|_| Ok(vec![season(1), season(2)]));
        catalog
            .expect_season_episodes()
            .times(2)
            .returning(move |_, n| {
                log.lock().unwrap().push(n);
                Ok(episodes(n, if n == 1 { 6 } else { 4 }))
            });

        let gate = CatalogGate::new(Arc::new(catalog));
        let table = gate.season_table("1399").await.unwrap();

        assert_eq!(
            table,
            vec![SeasonEpisodeCount::new(1, 6), SeasonEpisodeCount::new(2, 4)]
        );
        assert_eq!(*fetched.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_season_table_stops_at_first_failure() {
        let mut catalog = MockEpisodeCatalog::new();
        catalog
            .expect_seasons()
            .returning(|_| Ok(vec![season(1), season(2)]));
        catalog
            .expect_season_episodes()
            .times(1)
            .returning(|_, _| Err(AppError::ExternalApi("429 Too Many Requests".into())));

        let gate = CatalogGate::new(Arc::new(catalog));
        let err = gate.season_table("1399").await.unwrap_err();
        assert_eq!(err.kind(), "upstream_unavailable");
    }

    #[tokio::test]
    async fn test_season_episode_numbers() {
        let mut catalog = MockEpisodeCatalog::new();
        catalog
            .expect_season_episodes()
            .times(1)
            .returning(|_, n| Ok(episodes(n, 3)));

        let gate = CatalogGate::new(Arc::new(catalog));
        assert_eq!(
            gate.season_episode_numbers("1399", 2).await.unwrap(),
            vec![1, 2, 3]
        );
    }
}
