use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::UserWatchState,
};

use super::WatchStateRepository;

/// Process-local repository, used for tests and single-node local runs
#[derive(Debug, Default)]
pub struct InMemoryWatchStateRepository {
    records: RwLock<HashMap<String, UserWatchState>>,
    reject_writes: AtomicBool,
}

impl InMemoryWatchStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `save` fail, to exercise persist-failure paths
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl WatchStateRepository for InMemoryWatchStateRepository {
    async fn create_user(&self, user_id: &str) -> AppResult<UserWatchState> {
        let mut records = self.records.write().await;
        let state = records
            .entry(user_id.to_string())
            .or_insert_with(|| UserWatchState::new(user_id));
        Ok(state.clone())
    }

    async fn load(&self, user_id: &str) -> AppResult<Option<UserWatchState>> {
        Ok(self.records.read().await.get(user_id).cloned())
    }

    async fn save(&self, state: &UserWatchState) -> AppResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(AppError::Persist("store is rejecting writes".to_string()));
        }

        let mut records = self.records.write().await;
        match records.get_mut(&state.user_id) {
            Some(existing) => {
                *existing = state.clone();
                Ok(())
            }
            None => Err(AppError::UserNotFound(state.user_id.clone())),
        }
    }
}
