use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Kind of title tracked by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "movie"),
            MediaKind::Series => write!(f, "series"),
        }
    }
}

/// Canonical metadata used to enrich responses and events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaSummary {
    pub id: String,
    pub kind: MediaKind,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub release_date: Option<String>,
    /// Runtime in minutes (movies) or typical episode runtime (series)
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
}

/// One season as listed by the episode catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeasonSummary {
    pub season_number: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub episode_count: Option<u32>,
}

/// One episode as listed by the episode catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeSummary {
    pub season_number: u32,
    pub episode_number: u32,
    #[serde(default)]
    pub name: Option<String>,
}

/// Largest season accepted from callers
pub const MAX_EPISODES_PER_SEASON: u32 = 5_000;

/// Largest season table accepted from callers, summed over all seasons
pub const MAX_EPISODES_PER_SERIES: usize = 50_000;

/// Authoritative size of a season
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeasonEpisodeCount {
    pub season_number: u32,
    pub episode_count: u32,
}

impl SeasonEpisodeCount {
    pub fn new(season_number: u32, episode_count: u32) -> Self {
        Self {
            season_number,
            episode_count,
        }
    }
}

/// Total episodes across a season table
pub fn total_episodes(seasons: &[SeasonEpisodeCount]) -> usize {
    seasons.iter().map(|s| s.episode_count as usize).sum()
}
