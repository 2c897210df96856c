use serde::Deserialize;

mod media;
mod status;
mod watch_state;

pub use media::{
    total_episodes, EpisodeSummary, MediaKind, MediaSummary, SeasonEpisodeCount, SeasonSummary,
    MAX_EPISODES_PER_SEASON, MAX_EPISODES_PER_SERIES,
};
pub use status::{
    EnrichedMovie, EnrichedSeries, EnrichedTitle, SeriesProgress, WatchStats, WatchStatus,
};
pub use watch_state::{
    CompletionOverride, EpisodeToggle, EpisodeWatchRecord, IncrementOutcome, ResetOutcome,
    SeriesResetOutcome, SeriesWatchedEntry, UserWatchState, WatchedMovieEntry,
};

// ============================================================================
// TMDB API Types
// ============================================================================

/// Raw API response from GET /movie/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f32>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
}

impl From<TmdbMovie> for MediaSummary {
    fn from(movie: TmdbMovie) -> Self {
        MediaSummary {
            id: movie.id.to_string(),
            kind: MediaKind::Movie,
            title: movie.title,
            poster_path: movie.poster_path,
            rating: movie.vote_average,
            // TMDB reports an empty string for unknown dates
            release_date: movie.release_date.filter(|d| !d.is_empty()),
            runtime: movie.runtime,
            number_of_seasons: None,
        }
    }
}

/// Raw API response from GET /tv/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbShow {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f32>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    #[serde(default)]
    pub seasons: Vec<TmdbSeason>,
}

impl From<TmdbShow> for MediaSummary {
    fn from(show: TmdbShow) -> Self {
        MediaSummary {
            id: show.id.to_string(),
            kind: MediaKind::Series,
            title: show.name,
            poster_path: show.poster_path,
            rating: show.vote_average,
            release_date: show.first_air_date.filter(|d| !d.is_empty()),
            runtime: show.episode_run_time.first().copied(),
            number_of_seasons: show.number_of_seasons,
        }
    }
}

/// Season stub embedded in a TMDB show
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSeason {
    pub season_number: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub episode_count: Option<u32>,
}

impl From<TmdbSeason> for SeasonSummary {
    fn from(season: TmdbSeason) -> Self {
        SeasonSummary {
            season_number: season.season_number,
            name: season.name,
            episode_count: season.episode_count,
        }
    }
}

/// Raw API response from GET /tv/{id}/season/{n}
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSeasonDetails {
    pub season_number: u32,
    #[serde(default)]
    pub episodes: Vec<TmdbEpisode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbEpisode {
    pub episode_number: u32,
    #[serde(default)]
    pub season_number: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
}

impl TmdbSeasonDetails {
    pub fn into_episodes(self) -> Vec<EpisodeSummary> {
        let season_number = self.season_number;
        self.episodes
            .into_iter()
            .map(|e| EpisodeSummary {
                season_number: e.season_number.unwrap_or(season_number),
                episode_number: e.episode_number,
                name: e.name,
            })
            .collect()
    }
}
