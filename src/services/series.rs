use std::sync::Arc;

use chrono::Utc;

use crate::{
    db::WatchStateRepository,
    error::{AppError, AppResult},
    events::{EventPublisher, WatchEvent},
    models::{
        total_episodes, CompletionOverride, EnrichedSeries, MediaKind, SeasonEpisodeCount,
        SeriesProgress, SeriesResetOutcome, SeriesWatchedEntry, UserWatchState,
        MAX_EPISODES_PER_SEASON, MAX_EPISODES_PER_SERIES,
    },
    services::{
        catalog_gate::CatalogGate, completion::CompletionEvaluator, enrichment::Enricher,
        load_user, locks::KeyedLocks, require_id,
    },
};

fn check_episode_list(episodes: &[u32]) -> AppResult<()> {
    if episodes.len() > MAX_EPISODES_PER_SEASON as usize {
        return Err(AppError::InvalidInput(format!(
            "a season holds at most {} episodes",
            MAX_EPISODES_PER_SEASON
        )));
    }
    Ok(())
}

fn check_season_table(seasons: &[SeasonEpisodeCount]) -> AppResult<()> {
    if let Some(season) = seasons
        .iter()
        .find(|s| s.episode_count > MAX_EPISODES_PER_SEASON)
    {
        return Err(AppError::InvalidInput(format!(
            "season {} lists {} episodes, at most {} allowed",
            season.season_number, season.episode_count, MAX_EPISODES_PER_SEASON
        )));
    }
    if total_episodes(seasons) > MAX_EPISODES_PER_SERIES {
        return Err(AppError::InvalidInput(format!(
            "season table exceeds {} episodes",
            MAX_EPISODES_PER_SERIES
        )));
    }
    Ok(())
}

/// Per-episode progress, completion and watch-later state for series
#[derive(Clone)]
pub struct SeriesTracker {
    repo: Arc<dyn WatchStateRepository>,
    enricher: Enricher,
    catalog: CatalogGate,
    evaluator: CompletionEvaluator,
    events: Arc<dyn EventPublisher>,
    user_locks: KeyedLocks,
}

impl SeriesTracker {
    pub fn new(
        repo: Arc<dyn WatchStateRepository>,
        enricher: Enricher,
        catalog: CatalogGate,
        events: Arc<dyn EventPublisher>,
        user_locks: KeyedLocks,
    ) -> Self {
        Self {
            repo,
            enricher,
            evaluator: CompletionEvaluator::new(catalog.clone()),
            catalog,
            events,
            user_locks,
        }
    }

    async fn enriched(&self, state: &UserWatchState, series_id: &str) -> Option<EnrichedSeries> {
        match state.series(series_id) {
            Some(entry) => Some(self.enricher.series(entry).await),
            None => None,
        }
    }

    /// Watches an unwatched episode; un-watches a watched one, or rewatches
    /// it when `force` is set. An entry left without episodes is deleted.
    pub async fn toggle_episode_watched(
        &self,
        user_id: &str,
        series_id: &str,
        season_number: u32,
        episode_number: u32,
        force: bool,
    ) -> AppResult<Vec<SeriesWatchedEntry>> {
        require_id(series_id, "series")?;
        let _guard = self.user_locks.lock(user_id).await;
        let mut state = load_user(self.repo.as_ref(), user_id).await?;

        let toggle = state.series_entry(series_id).toggle_episode(
            season_number,
            episode_number,
            force,
            Utc::now(),
        );

        let removed = state.prune_series(series_id);
        if !removed {
            self.enricher.ensure(MediaKind::Series, series_id).await;
            if let Some(entry) = state.series_mut(series_id) {
                self.evaluator.evaluate(series_id, entry).await;
            }
        }

        state.touch();
        self.repo.save(&state).await?;

        tracing::info!(
            user_id = %user_id,
            series_id = %series_id,
            season_number,
            episode_number,
            toggle = ?toggle,
            series_removed = removed,
            "Episode toggled"
        );
        let series = self.enriched(&state, series_id).await;
        self.events.publish(
            user_id,
            WatchEvent::EpisodeToggled {
                series_id: series_id.to_string(),
                season_number,
                episode_number,
                series,
            },
        );

        Ok(state.watched_series)
    }

    /// Marks a season watched. Without an explicit episode list the season's
    /// episodes come from the catalog; failing to fetch them aborts the call.
    pub async fn mark_season_watched(
        &self,
        user_id: &str,
        series_id: &str,
        season_number: u32,
        episodes: Option<Vec<u32>>,
        increment: bool,
    ) -> AppResult<Vec<SeriesWatchedEntry>> {
        require_id(series_id, "series")?;
        if let Some(list) = &episodes {
            check_episode_list(list)?;
        }
        let _guard = self.user_locks.lock(user_id).await;
        let mut state = load_user(self.repo.as_ref(), user_id).await?;

        let episode_numbers = match episodes {
            Some(list) => list,
            None => self
                .catalog
                .season_episode_numbers(series_id, season_number)
                .await
                .map_err(AppError::catalog)?,
        };

        let changed = state.series_entry(series_id).mark_episodes(
            season_number,
            &episode_numbers,
            increment,
            Utc::now(),
        );

        if changed == 0 {
            state.prune_series(series_id);
            tracing::debug!(
                user_id = %user_id,
                series_id = %series_id,
                season_number,
                "Season already marked, nothing changed"
            );
            return Ok(state.watched_series);
        }

        self.enricher.ensure(MediaKind::Series, series_id).await;
        if let Some(entry) = state.series_mut(series_id) {
            self.evaluator.evaluate(series_id, entry).await;
        }

        state.touch();
        self.repo.save(&state).await?;

        tracing::info!(
            user_id = %user_id,
            series_id = %series_id,
            season_number,
            changed,
            "Season marked watched"
        );
        let series = self.enriched(&state, series_id).await;
        self.events.publish(
            user_id,
            WatchEvent::SeasonMarked {
                series_id: series_id.to_string(),
                season_number,
                series,
            },
        );

        Ok(state.watched_series)
    }

    /// Marks every catalog episode watched and flags the series completed.
    ///
    /// The flag is set outright, not derived from the episode total.
    pub async fn mark_all_episodes_watched(
        &self,
        user_id: &str,
        series_id: &str,
        seasons: Option<Vec<SeasonEpisodeCount>>,
        increment: bool,
    ) -> AppResult<Vec<SeriesWatchedEntry>> {
        require_id(series_id, "series")?;
        if let Some(table) = &seasons {
            check_season_table(table)?;
        }
        let _guard = self.user_locks.lock(user_id).await;
        let mut state = load_user(self.repo.as_ref(), user_id).await?;

        let table = match seasons {
            Some(table) => table,
            None => self
                .catalog
                .season_table(series_id)
                .await
                .map_err(AppError::catalog)?,
        };

        state
            .series_entry(series_id)
            .rebuild_all_watched(&table, increment, Utc::now());
        self.enricher.ensure(MediaKind::Series, series_id).await;

        state.touch();
        self.repo.save(&state).await?;

        tracing::info!(
            user_id = %user_id,
            series_id = %series_id,
            seasons = table.len(),
            increment,
            "Series marked watched"
        );
        let series = self.enriched(&state, series_id).await;
        self.events.publish(
            user_id,
            WatchEvent::SeriesMarkedWatched {
                series_id: series_id.to_string(),
                series,
                watched_series: state.watched_series.clone(),
            },
        );

        Ok(state.watched_series)
    }

    /// Manual completion override
    pub async fn toggle_series_completed(
        &self,
        user_id: &str,
        series_id: &str,
        is_completed: bool,
    ) -> AppResult<Vec<SeriesWatchedEntry>> {
        require_id(series_id, "series")?;
        let _guard = self.user_locks.lock(user_id).await;
        let mut state = load_user(self.repo.as_ref(), user_id).await?;

        let outcome = state.set_series_completed(series_id, is_completed);
        if outcome == CompletionOverride::Unchanged {
            return Ok(state.watched_series);
        }
        if outcome == CompletionOverride::Created {
            self.enricher.ensure(MediaKind::Series, series_id).await;
        }

        state.touch();
        self.repo.save(&state).await?;

        tracing::info!(
            user_id = %user_id,
            series_id = %series_id,
            is_completed,
            outcome = ?outcome,
            "Series completion overridden"
        );
        self.events.publish(
            user_id,
            WatchEvent::SeriesCompletedToggled {
                series_id: series_id.to_string(),
                is_completed,
            },
        );

        Ok(state.watched_series)
    }

    /// One undo step for every episode of the series
    pub async fn reset_series_watched(
        &self,
        user_id: &str,
        series_id: &str,
    ) -> AppResult<Vec<SeriesWatchedEntry>> {
        require_id(series_id, "series")?;
        let _guard = self.user_locks.lock(user_id).await;
        let mut state = load_user(self.repo.as_ref(), user_id).await?;

        let outcome = state.reset_series(series_id);
        if outcome == SeriesResetOutcome::Absent {
            return Ok(state.watched_series);
        }

        state.touch();
        self.repo.save(&state).await?;

        tracing::info!(
            user_id = %user_id,
            series_id = %series_id,
            outcome = ?outcome,
            "Series progress reset one step"
        );
        let series = self.enriched(&state, series_id).await;
        self.events.publish(
            user_id,
            WatchEvent::SeriesMarkedWatched {
                series_id: series_id.to_string(),
                series,
                watched_series: state.watched_series.clone(),
            },
        );
        self.events.publish(
            user_id,
            WatchEvent::SeriesCompletedToggled {
                series_id: series_id.to_string(),
                is_completed: false,
            },
        );

        Ok(state.watched_series)
    }

    /// Flips series watch-later membership and returns the new set
    pub async fn toggle_series_watch_later(
        &self,
        user_id: &str,
        series_id: &str,
    ) -> AppResult<Vec<String>> {
        require_id(series_id, "series")?;
        let _guard = self.user_locks.lock(user_id).await;
        let mut state = load_user(self.repo.as_ref(), user_id).await?;

        let added = state.toggle_series_watch_later(series_id);
        state.touch();
        if added {
            self.enricher.ensure(MediaKind::Series, series_id).await;
        }
        self.repo.save(&state).await?;

        let added_item = if added {
            Some(self.enricher.title(MediaKind::Series, series_id).await)
        } else {
            None
        };

        tracing::info!(user_id = %user_id, series_id = %series_id, added, "Series watch-later toggled");
        self.events.publish(
            user_id,
            WatchEvent::SeriesWatchLaterToggled {
                series_id: series_id.to_string(),
                watch_later: state.series_watch_later.clone(),
                added: added_item,
            },
        );

        Ok(state.series_watch_later)
    }

    /// Stored progress for one series
    pub async fn get_series_progress(
        &self,
        user_id: &str,
        series_id: &str,
    ) -> AppResult<SeriesProgress> {
        require_id(series_id, "series")?;
        let state = load_user(self.repo.as_ref(), user_id).await?;
        Ok(SeriesProgress::from_entry(series_id, state.series(series_id)))
    }
}
