use crate::{
    db::WatchStateRepository,
    error::{AppError, AppResult},
    models::UserWatchState,
};

pub mod catalog_gate;
pub mod completion;
pub mod enrichment;
pub mod locks;
pub mod media_cache;
pub mod movies;
pub mod providers;
pub mod series;

pub use catalog_gate::CatalogGate;
pub use completion::CompletionEvaluator;
pub use enrichment::Enricher;
pub use locks::KeyedLocks;
pub use media_cache::{InMemoryMediaCache, MediaCacheGateway, RedisMediaCache};
pub use movies::MovieTracker;
pub use series::SeriesTracker;

/// Loads a user's record, mapping absence to `UserNotFound`
pub(crate) async fn load_user(
    repo: &dyn WatchStateRepository,
    user_id: &str,
) -> AppResult<UserWatchState> {
    repo.load(user_id)
        .await?
        .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))
}

pub(crate) fn require_id(id: &str, what: &str) -> AppResult<()> {
    if id.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{} id cannot be empty", what)));
    }
    Ok(())
}
