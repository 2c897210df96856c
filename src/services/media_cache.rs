use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{MediaKind, MediaSummary},
    services::providers::MetadataProvider,
};

/// Lookup store for canonical title metadata
#[async_trait::async_trait]
pub trait MediaCacheGateway: Send + Sync {
    /// Makes sure metadata for the title is present; idempotent
    async fn ensure_cached(&self, kind: MediaKind, id: &str) -> AppResult<()>;

    /// Reads cached metadata without touching upstream
    async fn lookup(&self, kind: MediaKind, id: &str) -> AppResult<Option<MediaSummary>>;
}

/// Redis-backed metadata cache filled from a [`MetadataProvider`]
pub struct RedisMediaCache {
    cache: Cache,
    provider: Arc<dyn MetadataProvider>,
    ttl: u64,
}

impl RedisMediaCache {
    pub fn new(cache: Cache, provider: Arc<dyn MetadataProvider>, ttl: u64) -> Self {
        Self {
            cache,
            provider,
            ttl,
        }
    }
}

#[async_trait::async_trait]
impl MediaCacheGateway for RedisMediaCache {
    async fn ensure_cached(&self, kind: MediaKind, id: &str) -> AppResult<()> {
        let key = CacheKey::Media(kind, id.to_string());
        if self.cache.contains(&key).await? {
            tracing::debug!(key = %key, "Metadata already cached");
            return Ok(());
        }

        let summary = self.provider.fetch_metadata(kind, id).await?;
        // Written synchronously so the caller's read-back sees it
        self.cache.set(&key, &summary, self.ttl).await?;

        tracing::info!(
            kind = %kind,
            id = %id,
            provider = self.provider.name(),
            "Cached title metadata"
        );
        Ok(())
    }

    async fn lookup(&self, kind: MediaKind, id: &str) -> AppResult<Option<MediaSummary>> {
        self.cache
            .get_from_cache(&CacheKey::Media(kind, id.to_string()))
            .await
    }
}

/// Process-local metadata cache.
///
/// Titles registered with [`with_title`](Self::with_title) play the part of
/// upstream metadata; they only become visible to `lookup` once
/// `ensure_cached` has been called for them.
#[derive(Debug, Default)]
pub struct InMemoryMediaCache {
    upstream: HashMap<(MediaKind, String), MediaSummary>,
    cached: RwLock<HashSet<(MediaKind, String)>>,
    ensure_calls: AtomicUsize,
}

impl InMemoryMediaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, summary: MediaSummary) -> Self {
        self.upstream
            .insert((summary.kind, summary.id.clone()), summary);
        self
    }

    /// Number of `ensure_cached` calls so far
    pub fn ensure_calls(&self) -> usize {
        self.ensure_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MediaCacheGateway for InMemoryMediaCache {
    async fn ensure_cached(&self, kind: MediaKind, id: &str) -> AppResult<()> {
        self.ensure_calls.fetch_add(1, Ordering::SeqCst);
        let key = (kind, id.to_string());
        if !self.upstream.contains_key(&key) {
            return Err(AppError::ExternalApi(format!("no metadata for {} {}", kind, id)));
        }
        self.cached.write().await.insert(key);
        Ok(())
    }

    async fn lookup(&self, kind: MediaKind, id: &str) -> AppResult<Option<MediaSummary>> {
        let key = (kind, id.to_string());
        if !self.cached.read().await.contains(&key) {
            return Ok(None);
        }
        Ok(self.upstream.get(&key).cloned())
    }
}
