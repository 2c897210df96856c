//! Event contract for pushing watch-state changes to a user's live sessions.
//!
//! Trackers depend only on [`EventPublisher`]; the in-process
//! [`BroadcastHub`] is one implementation of it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{EnrichedMovie, EnrichedSeries, EnrichedTitle, SeriesWatchedEntry, WatchedMovieEntry};

mod hub;

pub use hub::BroadcastHub;

/// A state change on one user's watch record
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum WatchEvent {
    MovieWatched {
        movie_id: String,
        item: EnrichedMovie,
        watch_later: Vec<String>,
    },
    MovieProgressUpdated {
        movie_id: String,
        watched: Vec<WatchedMovieEntry>,
    },
    WatchLaterToggled {
        movie_id: String,
        watch_later: Vec<String>,
        added: Option<EnrichedTitle>,
    },
    EpisodeToggled {
        series_id: String,
        season_number: u32,
        episode_number: u32,
        series: Option<EnrichedSeries>,
    },
    SeasonMarked {
        series_id: String,
        season_number: u32,
        series: Option<EnrichedSeries>,
    },
    SeriesMarkedWatched {
        series_id: String,
        series: Option<EnrichedSeries>,
        watched_series: Vec<SeriesWatchedEntry>,
    },
    SeriesCompletedToggled {
        series_id: String,
        is_completed: bool,
    },
    SeriesWatchLaterToggled {
        series_id: String,
        watch_later: Vec<String>,
        added: Option<EnrichedTitle>,
    },
}

impl WatchEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            WatchEvent::MovieWatched { .. } => "movie_watched",
            WatchEvent::MovieProgressUpdated { .. } => "movie_progress_updated",
            WatchEvent::WatchLaterToggled { .. } => "watch_later_toggled",
            WatchEvent::EpisodeToggled { .. } => "episode_toggled",
            WatchEvent::SeasonMarked { .. } => "season_marked",
            WatchEvent::SeriesMarkedWatched { .. } => "series_marked_watched",
            WatchEvent::SeriesCompletedToggled { .. } => "series_completed_toggled",
            WatchEvent::SeriesWatchLaterToggled { .. } => "series_watch_later_toggled",
        }
    }
}

/// What a subscribed session receives
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserEvent {
    pub user_id: String,
    pub emitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: WatchEvent,
}

/// Publish side of the per-user fan-out channel.
///
/// Delivery is at-most-once to sessions subscribed at the time of the call.
/// Nothing is queued for sessions that connect later.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, user_id: &str, event: WatchEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag_and_camel_case_fields() {
        let event = WatchEvent::SeriesCompletedToggled {
            series_id: "1399".to_string(),
            is_completed: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "series_completed_toggled");
        assert_eq!(json["seriesId"], "1399");
        assert_eq!(json["isCompleted"], true);
        assert_eq!(event.name(), "series_completed_toggled");
    }

    #[test]
    fn test_user_event_flattens_payload() {
        let envelope = UserEvent {
            user_id: "u1".to_string(),
            emitted_at: Utc::now(),
            event: WatchEvent::MovieProgressUpdated {
                movie_id: "603".to_string(),
                watched: vec![],
            },
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["event"], "movie_progress_updated");
        assert_eq!(json["movieId"], "603");
    }
}
