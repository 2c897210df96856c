//! Upstream metadata and episode catalog providers
//!
//! The engine consumes two upstream capabilities: canonical title metadata
//! (to enrich responses) and the authoritative season/episode catalog (to
//! derive completion and to expand season-level marks).

use crate::{
    error::AppResult,
    models::{EpisodeSummary, MediaKind, MediaSummary, SeasonSummary},
};

pub mod static_catalog;
pub mod tmdb;

pub use static_catalog::StaticCatalog;
pub use tmdb::TmdbClient;

/// Authoritative source of a series' seasons and episodes
///
/// Upstream calls are rate limited; go through
/// [`CatalogGate`](crate::services::CatalogGate) rather than calling this
/// concurrently.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EpisodeCatalog: Send + Sync {
    /// Regular seasons of a series, ascending
    async fn seasons(&self, series_id: &str) -> AppResult<Vec<SeasonSummary>>;

    /// Episodes of one season, ascending
    async fn season_episodes(
        &self,
        series_id: &str,
        season_number: u32,
    ) -> AppResult<Vec<EpisodeSummary>>;
}

/// Source of canonical title metadata
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn fetch_metadata(&self, kind: MediaKind, id: &str) -> AppResult<MediaSummary>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
