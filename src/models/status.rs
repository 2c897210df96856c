use serde::Serialize;

use super::{EpisodeWatchRecord, MediaSummary, SeriesWatchedEntry, WatchedMovieEntry};

/// Watched movie joined with its cached metadata
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedMovie {
    #[serde(flatten)]
    pub entry: WatchedMovieEntry,
    pub metadata: Option<MediaSummary>,
}

/// Watched series joined with its cached metadata
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedSeries {
    #[serde(flatten)]
    pub entry: SeriesWatchedEntry,
    pub metadata: Option<MediaSummary>,
}

/// Watch-later member joined with its cached metadata
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTitle {
    pub id: String,
    pub metadata: Option<MediaSummary>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WatchStats {
    pub watched_count: usize,
    pub watch_later_count: usize,
    pub series_count: usize,
    pub completed_series_count: usize,
    pub series_watch_later_count: usize,
    pub episodes_watched: usize,
}

/// Full status read; what a reconnecting client uses to resynchronize
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchStatus {
    pub watched: Vec<EnrichedMovie>,
    pub watch_later: Vec<EnrichedTitle>,
    pub watched_series: Vec<EnrichedSeries>,
    pub series_watch_later: Vec<EnrichedTitle>,
    pub stats: WatchStats,
}

/// Progress for a single series
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeriesProgress {
    pub series_id: String,
    pub episodes: Vec<EpisodeWatchRecord>,
    pub total_watched: usize,
    pub is_completed: bool,
}

impl SeriesProgress {
    pub fn from_entry(series_id: &str, entry: Option<&SeriesWatchedEntry>) -> Self {
        match entry {
            Some(entry) => Self {
                series_id: series_id.to_string(),
                episodes: entry.episodes.clone(),
                total_watched: entry.watched_episode_count(),
                is_completed: entry.is_completed,
            },
            None => Self {
                series_id: series_id.to_string(),
                episodes: Vec::new(),
                total_watched: 0,
                is_completed: false,
            },
        }
    }
}
