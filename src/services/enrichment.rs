use std::sync::Arc;

use crate::{
    models::{
        EnrichedMovie, EnrichedSeries, EnrichedTitle, MediaKind, MediaSummary, SeriesWatchedEntry,
        UserWatchState, WatchStats, WatchStatus, WatchedMovieEntry,
    },
    services::media_cache::MediaCacheGateway,
};

/// Joins watch records with cached metadata.
///
/// Enrichment is best effort: metadata failures are logged and the item is
/// returned without metadata. A mutation never fails because of it.
#[derive(Clone)]
pub struct Enricher {
    media: Arc<dyn MediaCacheGateway>,
}

impl Enricher {
    pub fn new(media: Arc<dyn MediaCacheGateway>) -> Self {
        Self { media }
    }

    pub async fn ensure(&self, kind: MediaKind, id: &str) {
        if let Err(e) = self.media.ensure_cached(kind, id).await {
            tracing::warn!(kind = %kind, id = %id, error = %e, "Failed to cache title metadata");
        }
    }

    async fn metadata(&self, kind: MediaKind, id: &str) -> Option<MediaSummary> {
        match self.media.lookup(kind, id).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(kind = %kind, id = %id, error = %e, "Metadata lookup failed");
                None
            }
        }
    }

    pub async fn movie(&self, entry: &WatchedMovieEntry) -> EnrichedMovie {
        EnrichedMovie {
            metadata: self.metadata(MediaKind::Movie, &entry.movie_id).await,
            entry: entry.clone(),
        }
    }

    pub async fn series(&self, entry: &SeriesWatchedEntry) -> EnrichedSeries {
        EnrichedSeries {
            metadata: self.metadata(MediaKind::Series, &entry.series_id).await,
            entry: entry.clone(),
        }
    }

    pub async fn title(&self, kind: MediaKind, id: &str) -> EnrichedTitle {
        EnrichedTitle {
            id: id.to_string(),
            metadata: self.metadata(kind, id).await,
        }
    }

    /// Full enriched status projection of one user's record
    pub async fn status(&self, state: &UserWatchState) -> WatchStatus {
        let mut watched = Vec::with_capacity(state.watched_movies.len());
        for entry in &state.watched_movies {
            watched.push(self.movie(entry).await);
        }

        let mut watch_later = Vec::with_capacity(state.watch_later.len());
        for id in &state.watch_later {
            watch_later.push(self.title(MediaKind::Movie, id).await);
        }

        let mut watched_series = Vec::with_capacity(state.watched_series.len());
        for entry in &state.watched_series {
            watched_series.push(self.series(entry).await);
        }

        let mut series_watch_later = Vec::with_capacity(state.series_watch_later.len());
        for id in &state.series_watch_later {
            series_watch_later.push(self.title(MediaKind::Series, id).await);
        }

        WatchStatus {
            watched,
            watch_later,
            watched_series,
            series_watch_later,
            stats: stats(state),
        }
    }
}

/// Summary counts for a user's record
pub fn stats(state: &UserWatchState) -> WatchStats {
    WatchStats {
        watched_count: state.watched_movies.len(),
        watch_later_count: state.watch_later.len(),
        series_count: state.watched_series.len(),
        completed_series_count: state
            .watched_series
            .iter()
            .filter(|s| s.is_completed)
            .count(),
        series_watch_later_count: state.series_watch_later.len(),
        episodes_watched: state
            .watched_series
            .iter()
            .map(|s| s.watched_episode_count())
            .sum(),
    }
}
