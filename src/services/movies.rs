use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    db::WatchStateRepository,
    error::AppResult,
    events::{EventPublisher, WatchEvent},
    models::{MediaKind, ResetOutcome, WatchStatus, WatchedMovieEntry},
    services::{enrichment::Enricher, load_user, locks::KeyedLocks, require_id},
};

/// Watched/watch-later state for movies
#[derive(Clone)]
pub struct MovieTracker {
    repo: Arc<dyn WatchStateRepository>,
    enricher: Enricher,
    events: Arc<dyn EventPublisher>,
    user_locks: KeyedLocks,
}

impl MovieTracker {
    pub fn new(
        repo: Arc<dyn WatchStateRepository>,
        enricher: Enricher,
        events: Arc<dyn EventPublisher>,
        user_locks: KeyedLocks,
    ) -> Self {
        Self {
            repo,
            enricher,
            events,
            user_locks,
        }
    }

    /// Records one viewing per timestamp (one if the batch is empty) and
    /// takes the movie off the watch-later list.
    pub async fn increment_watched(
        &self,
        user_id: &str,
        movie_id: &str,
        duration: u32,
        watched_at: Vec<DateTime<Utc>>,
    ) -> AppResult<Vec<WatchedMovieEntry>> {
        require_id(movie_id, "movie")?;
        let _guard = self.user_locks.lock(user_id).await;
        let mut state = load_user(self.repo.as_ref(), user_id).await?;

        let outcome = state.increment_movie(movie_id, duration, watched_at);
        state.touch();

        self.enricher.ensure(MediaKind::Movie, movie_id).await;
        self.repo.save(&state).await?;

        if let Some(entry) = state.movie(movie_id) {
            let item = self.enricher.movie(entry).await;
            tracing::info!(
                user_id = %user_id,
                movie_id = %movie_id,
                count = entry.count,
                created = outcome.created,
                left_watch_later = outcome.left_watch_later,
                "Movie watched"
            );
            self.events.publish(
                user_id,
                WatchEvent::MovieWatched {
                    movie_id: movie_id.to_string(),
                    item,
                    watch_later: state.watch_later.clone(),
                },
            );
        }

        Ok(state.watched_movies)
    }

    /// Undoes the most recent viewing: decrements the count, or removes the
    /// entry when it was watched only once.
    pub async fn reset_watched(
        &self,
        user_id: &str,
        movie_id: &str,
    ) -> AppResult<Vec<WatchedMovieEntry>> {
        require_id(movie_id, "movie")?;
        let _guard = self.user_locks.lock(user_id).await;
        let mut state = load_user(self.repo.as_ref(), user_id).await?;

        let outcome = state.reset_movie(movie_id);
        if outcome == ResetOutcome::Absent {
            tracing::debug!(user_id = %user_id, movie_id = %movie_id, "Nothing to reset");
            return Ok(state.watched_movies);
        }

        state.touch();
        self.repo.save(&state).await?;

        tracing::info!(
            user_id = %user_id,
            movie_id = %movie_id,
            outcome = ?outcome,
            "Movie progress reset one step"
        );
        self.events.publish(
            user_id,
            WatchEvent::MovieProgressUpdated {
                movie_id: movie_id.to_string(),
                watched: state.watched_movies.clone(),
            },
        );

        Ok(state.watched_movies)
    }

    /// Flips watch-later membership and returns the new set
    pub async fn toggle_watch_later(&self, user_id: &str, movie_id: &str) -> AppResult<Vec<String>> {
        require_id(movie_id, "movie")?;
        let _guard = self.user_locks.lock(user_id).await;
        let mut state = load_user(self.repo.as_ref(), user_id).await?;

        let added = state.toggle_movie_watch_later(movie_id);
        state.touch();
        if added {
            self.enricher.ensure(MediaKind::Movie, movie_id).await;
        }
        self.repo.save(&state).await?;

        let added_item = if added {
            Some(self.enricher.title(MediaKind::Movie, movie_id).await)
        } else {
            None
        };

        tracing::info!(user_id = %user_id, movie_id = %movie_id, added, "Watch-later toggled");
        self.events.publish(
            user_id,
            WatchEvent::WatchLaterToggled {
                movie_id: movie_id.to_string(),
                watch_later: state.watch_later.clone(),
                added: added_item,
            },
        );

        Ok(state.watch_later)
    }

    /// Full enriched status; what a reconnecting session reads to resync
    pub async fn get_status(&self, user_id: &str) -> AppResult<WatchStatus> {
        let state = load_user(self.repo.as_ref(), user_id).await?;
        Ok(self.enricher.status(&state).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryWatchStateRepository;
    use crate::error::AppError;
    use crate::events::BroadcastHub;
    use crate::models::MediaSummary;
    use crate::services::media_cache::InMemoryMediaCache;
    use chrono::TimeZone;
    use tokio::sync::broadcast::error::TryRecvError;

    struct Harness {
        tracker: MovieTracker,
        repo: Arc<InMemoryWatchStateRepository>,
        media: Arc<InMemoryMediaCache>,
        hub: Arc<BroadcastHub>,
    }

    async fn harness() -> Harness {
        let repo = Arc::new(InMemoryWatchStateRepository::new());
        repo.create_user("u1").await.unwrap();
        let media = Arc::new(InMemoryMediaCache::new().with_title(MediaSummary {
            id: "603".to_string(),
            kind: MediaKind::Movie,
            title: "The Matrix".to_string(),
            poster_path: None,
            rating: None,
            release_date: None,
            runtime: Some(136),
            number_of_seasons: None,
        }));
        let hub = Arc::new(BroadcastHub::default());
        let tracker = MovieTracker::new(
            repo.clone(),
            Enricher::new(media.clone()),
            hub.clone(),
            KeyedLocks::new(),
        );
        Harness {
            tracker,
            repo,
            media,
            hub,
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_increment_twice_accumulates() {
        let h = harness().await;
        h.tracker
            .increment_watched("u1", "603", 8160, vec![day(1)])
            .await
            .unwrap();
        let watched = h
            .tracker
            .increment_watched("u1", "603", 8160, vec![day(2), day(3)])
            .await
            .unwrap();

        assert_eq!(watched.len(), 1);
        assert_eq!(watched[0].count, 3);
        assert_eq!(watched[0].watched_at, vec![day(1), day(2), day(3)]);
    }

    #[tokio::test]
    async fn test_increment_publishes_enriched_event_and_leaves_watch_later() {
        let h = harness().await;
        h.tracker.toggle_watch_later("u1", "603").await.unwrap();
        let mut session = h.hub.subscribe("u1");

        h.tracker
            .increment_watched("u1", "603", 8160, vec![day(1)])
            .await
            .unwrap();

        let received = session.recv().await.unwrap();
        match received.event {
            WatchEvent::MovieWatched {
                movie_id,
                item,
                watch_later,
            } => {
                assert_eq!(movie_id, "603");
                assert_eq!(item.metadata.unwrap().title, "The Matrix");
                assert!(watch_later.is_empty());
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(h.media.ensure_calls() >= 1);

        let stored = h.repo.load("u1").await.unwrap().unwrap();
        assert!(stored.watch_later.is_empty());
    }

    #[tokio::test]
    async fn test_reset_three_times_clears_entry() {
        let h = harness().await;
        h.tracker
            .increment_watched("u1", "603", 8160, vec![day(1), day(2), day(3)])
            .await
            .unwrap();

        let watched = h.tracker.reset_watched("u1", "603").await.unwrap();
        assert_eq!(watched[0].count, 2);
        assert_eq!(watched[0].watched_at, vec![day(1), day(2)]);

        h.tracker.reset_watched("u1", "603").await.unwrap();
        let watched = h.tracker.reset_watched("u1", "603").await.unwrap();
        assert!(watched.is_empty());
    }

    #[tokio::test]
    async fn test_reset_of_unwatched_movie_publishes_nothing() {
        let h = harness().await;
        let mut session = h.hub.subscribe("u1");

        let watched = h.tracker.reset_watched("u1", "603").await.unwrap();
        assert!(watched.is_empty());
        assert!(matches!(session.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_toggle_watch_later_carries_added_item_only_when_adding() {
        let h = harness().await;
        let mut session = h.hub.subscribe("u1");

        let set = h.tracker.toggle_watch_later("u1", "603").await.unwrap();
        assert_eq!(set, vec!["603".to_string()]);
        let set = h.tracker.toggle_watch_later("u1", "603").await.unwrap();
        assert!(set.is_empty());

        let first = session.recv().await.unwrap();
        let second = session.recv().await.unwrap();
        assert!(matches!(
            first.event,
            WatchEvent::WatchLaterToggled { added: Some(_), .. }
        ));
        assert!(matches!(
            second.event,
            WatchEvent::WatchLaterToggled { added: None, .. }
        ));
    }

    #[tokio::test]
    async fn test_unknown_user_is_rejected_without_event() {
        let h = harness().await;
        let mut session = h.hub.subscribe("ghost");

        let err = h
            .tracker
            .increment_watched("ghost", "603", 1, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UserNotFound(_)));
        assert!(matches!(session.try_recv(), Err(TryRecvError::Empty)));

        let err = h.tracker.get_status("ghost").await.unwrap_err();
        assert_eq!(err.kind(), "user_not_found");
    }

    #[tokio::test]
    async fn test_persist_failure_publishes_nothing() {
        let h = harness().await;
        let mut session = h.hub.subscribe("u1");
        h.repo.reject_writes(true);

        let err = h
            .tracker
            .increment_watched("u1", "603", 1, vec![day(1)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "persist_failed");
        assert!(matches!(session.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_concurrent_increments_for_one_user_are_not_lost() {
        let h = harness().await;
        let mut tasks = Vec::new();
        for i in 0..16 {
            let tracker = h.tracker.clone();
            tasks.push(tokio::spawn(async move {
                tracker
                    .increment_watched("u1", &format!("movie-{}", i), 100, vec![])
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = h.repo.load("u1").await.unwrap().unwrap();
        assert_eq!(stored.watched_movies.len(), 16);
    }

    #[tokio::test]
    async fn test_empty_movie_id_is_invalid() {
        let h = harness().await;
        let err = h.tracker.toggle_watch_later("u1", " ").await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }
}
