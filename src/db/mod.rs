use crate::{error::AppResult, models::UserWatchState};

pub mod memory;
pub mod postgres;
pub mod redis;

pub use memory::InMemoryWatchStateRepository;
pub use postgres::{create_pool, run_migrations, PgWatchStateRepository};
pub use self::redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle};

/// Persistence for per-user watch-state records
///
/// The store offers whole-document read and write only. Callers serialize
/// read-modify-write sequences per user themselves.
#[async_trait::async_trait]
pub trait WatchStateRepository: Send + Sync {
    /// Creates an empty record if none exists and returns the stored record
    async fn create_user(&self, user_id: &str) -> AppResult<UserWatchState>;

    /// Loads a user's record, `None` if the user has never been registered
    async fn load(&self, user_id: &str) -> AppResult<Option<UserWatchState>>;

    /// Replaces a user's record; fails with `UserNotFound` if it does not exist
    async fn save(&self, state: &UserWatchState) -> AppResult<()>;
}
