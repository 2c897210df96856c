use crate::{
    models::{total_episodes, SeriesWatchedEntry},
    services::catalog_gate::CatalogGate,
};

/// Derives the "series completed" flag from the authoritative catalog
#[derive(Clone)]
pub struct CompletionEvaluator {
    gate: CatalogGate,
}

impl CompletionEvaluator {
    pub fn new(gate: CatalogGate) -> Self {
        Self { gate }
    }

    /// Recomputes `entry.is_completed`.
    ///
    /// Completed iff the catalog reports at least one episode and the user has
    /// watched at least that many. Catalog failures are logged and the previous
    /// flag is kept.
    pub async fn evaluate(&self, series_id: &str, entry: &mut SeriesWatchedEntry) {
        let seasons = match self.gate.season_table(series_id).await {
            Ok(seasons) => seasons,
            Err(e) => {
                tracing::warn!(
                    series_id = %series_id,
                    error = %e,
                    kept = entry.is_completed,
                    "Completion check failed, keeping previous flag"
                );
                return;
            }
        };

        let total = total_episodes(&seasons);
        let watched = entry.watched_episode_count();
        entry.is_completed = total > 0 && watched >= total;

        tracing::debug!(
            series_id = %series_id,
            watched,
            total,
            is_completed = entry.is_completed,
            "Evaluated series completion"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{EpisodeSummary, SeasonSummary};
    use crate::services::providers::MockEpisodeCatalog;
    use chrono::Utc;
    use std::sync::Arc;

    /// Two seasons, 6 + 4 episodes
    fn ten_episode_catalog() -> MockEpisodeCatalog {
        let mut catalog = MockEpisodeCatalog::new();
        catalog.expect_seasons().returning(|_| {
            Ok((1..=2)
                .map(|n| SeasonSummary {
                    season_number: n,
                    name: None,
                    episode_count: None,
                })
                .collect())
        });
        catalog.expect_season_episodes().returning(|_, season_number| {
            let count = if season_number == 1 { 6 } else { 4 };
            Ok((1..=count)
                .map(|episode_number| EpisodeSummary {
                    season_number,
                    episode_number,
                    name: None,
                })
                .collect())
        });
        catalog
    }

    fn watch_first(entry: &mut SeriesWatchedEntry, n: usize) {
        let pairs = (1..=6).map(|e| (1, e)).chain((1..=4).map(|e| (2, e)));
        for (season, episode) in pairs.take(n) {
            entry.toggle_episode(season, episode, false, Utc::now());
        }
    }

    #[tokio::test]
    async fn test_completed_only_after_last_episode() {
        let evaluator = CompletionEvaluator::new(CatalogGate::new(Arc::new(ten_episode_catalog())));
        let mut entry = SeriesWatchedEntry::new("1399");

        watch_first(&mut entry, 9);
        evaluator.evaluate("1399", &mut entry).await;
        assert!(!entry.is_completed);

        entry.toggle_episode(2, 4, false, Utc::now());
        evaluator.evaluate("1399", &mut entry).await;
        assert!(entry.is_completed);
    }

    #[tokio::test]
    async fn test_empty_catalog_never_completes() {
        let mut catalog = MockEpisodeCatalog::new();
        catalog.expect_seasons().returning(|_| Ok(vec![]));
        let evaluator = CompletionEvaluator::new(CatalogGate::new(Arc::new(catalog)));

        let mut entry = SeriesWatchedEntry::new("1399");
        entry.is_completed = true;
        evaluator.evaluate("1399", &mut entry).await;
        assert!(!entry.is_completed);
    }

    #[tokio::test]
    async fn test_catalog_failure_keeps_previous_flag() {
        let mut catalog = MockEpisodeCatalog::new();
        catalog
            .expect_seasons()
            .returning(|_| Err(AppError::ExternalApi("503".into())));
        let evaluator = CompletionEvaluator::new(CatalogGate::new(Arc::new(catalog)));

        let mut entry = SeriesWatchedEntry::new("1399");
        entry.is_completed = true;
        evaluator.evaluate("1399", &mut entry).await;
        assert!(entry.is_completed);

        entry.is_completed = false;
        evaluator.evaluate("1399", &mut entry).await;
        assert!(!entry.is_completed);
    }
}
