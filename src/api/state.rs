use std::sync::Arc;

use crate::{
    db::WatchStateRepository,
    events::EventPublisher,
    services::{
        providers::EpisodeCatalog, CatalogGate, Enricher, KeyedLocks, MediaCacheGateway,
        MovieTracker, SeriesTracker,
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn WatchStateRepository>,
    pub movies: MovieTracker,
    pub series: SeriesTracker,
}

impl AppState {
    /// Wires both trackers over one repository.
    ///
    /// Movie and series operations mutate the same per-user record, so they
    /// share a single set of per-user locks.
    pub fn new(
        repo: Arc<dyn WatchStateRepository>,
        media: Arc<dyn MediaCacheGateway>,
        catalog: Arc<dyn EpisodeCatalog>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        let user_locks = KeyedLocks::new();
        let enricher = Enricher::new(media);

        let movies = MovieTracker::new(
            repo.clone(),
            enricher.clone(),
            events.clone(),
            user_locks.clone(),
        );
        let series = SeriesTracker::new(
            repo.clone(),
            enricher,
            CatalogGate::new(catalog),
            events,
            user_locks,
        );

        Self {
            repo,
            movies,
            series,
        }
    }
}
