use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SeasonEpisodeCount;

/// A movie the user has watched at least once
///
/// `count` and `watched_at` are allowed to drift apart: an increment with an
/// empty timestamp batch bumps `count` without recording a timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchedMovieEntry {
    pub movie_id: String,
    pub count: u32,
    /// Runtime in seconds, cached from metadata
    pub duration: u32,
    /// Deduplicated, ascending
    #[serde(default)]
    pub watched_at: Vec<DateTime<Utc>>,
}

impl WatchedMovieEntry {
    fn new(movie_id: String, duration: u32, batch: Vec<DateTime<Utc>>) -> Self {
        let count = batch_weight(&batch);
        let mut entry = Self {
            movie_id,
            count,
            duration,
            watched_at: Vec::new(),
        };
        entry.merge_timestamps(batch);
        entry
    }

    fn merge_timestamps(&mut self, batch: Vec<DateTime<Utc>>) {
        self.watched_at.extend(batch);
        self.watched_at.sort();
        self.watched_at.dedup();
    }
}

/// An empty batch still counts as one viewing
fn batch_weight(batch: &[DateTime<Utc>]) -> u32 {
    u32::try_from(batch.len()).unwrap_or(u32::MAX).max(1)
}

/// Watch record for a single episode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeWatchRecord {
    pub season_number: u32,
    pub episode_number: u32,
    /// Last time this episode was watched
    pub watched_at: DateTime<Utc>,
    /// Rewatch counter, always at least 1
    pub count: u32,
}

impl EpisodeWatchRecord {
    pub fn new(season_number: u32, episode_number: u32, now: DateTime<Utc>) -> Self {
        Self {
            season_number,
            episode_number,
            watched_at: now,
            count: 1,
        }
    }

    fn is(&self, season_number: u32, episode_number: u32) -> bool {
        self.season_number == season_number && self.episode_number == episode_number
    }

    fn rewatch(&mut self, now: DateTime<Utc>) {
        self.count = self.count.saturating_add(1);
        self.watched_at = now;
    }
}

/// What happened to an episode record on toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeToggle {
    Added,
    Removed,
    Rewatched,
}

/// Per-series progress; unique by `(season_number, episode_number)`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeriesWatchedEntry {
    pub series_id: String,
    #[serde(default)]
    pub episodes: Vec<EpisodeWatchRecord>,
    #[serde(default)]
    pub is_completed: bool,
}

impl SeriesWatchedEntry {
    pub fn new(series_id: impl Into<String>) -> Self {
        Self {
            series_id: series_id.into(),
            episodes: Vec::new(),
            is_completed: false,
        }
    }

    /// Number of distinct episodes watched
    pub fn watched_episode_count(&self) -> usize {
        self.episodes.len()
    }

    pub fn episode(&self, season_number: u32, episode_number: u32) -> Option<&EpisodeWatchRecord> {
        self.episodes
            .iter()
            .find(|e| e.is(season_number, episode_number))
    }

    /// Un-watches an existing episode, or rewatches it when `force` is set.
    /// Absent episodes are always added.
    pub fn toggle_episode(
        &mut self,
        season_number: u32,
        episode_number: u32,
        force: bool,
        now: DateTime<Utc>,
    ) -> EpisodeToggle {
        match self
            .episodes
            .iter()
            .position(|e| e.is(season_number, episode_number))
        {
            Some(idx) if force => {
                self.episodes[idx].rewatch(now);
                EpisodeToggle::Rewatched
            }
            Some(idx) => {
                self.episodes.remove(idx);
                EpisodeToggle::Removed
            }
            None => {
                self.episodes
                    .push(EpisodeWatchRecord::new(season_number, episode_number, now));
                EpisodeToggle::Added
            }
        }
    }

    /// Marks the given episodes of one season as watched.
    ///
    /// Returns how many records were created or bumped.
    pub fn mark_episodes(
        &mut self,
        season_number: u32,
        episode_numbers: &[u32],
        increment: bool,
        now: DateTime<Utc>,
    ) -> usize {
        let mut season: HashMap<u32, usize> = self
            .episodes
            .iter()
            .enumerate()
            .filter(|(_, e)| e.season_number == season_number)
            .map(|(idx, e)| (e.episode_number, idx))
            .collect();

        let mut changed = 0;
        for &episode_number in episode_numbers {
            match season.get(&episode_number) {
                Some(&idx) if increment => {
                    self.episodes[idx].rewatch(now);
                    changed += 1;
                }
                Some(_) => {}
                None => {
                    season.insert(episode_number, self.episodes.len());
                    self.episodes
                        .push(EpisodeWatchRecord::new(season_number, episode_number, now));
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Rebuilds the episode list so every catalog episode is present.
    ///
    /// Existing records keep their counts (bumped when `increment` is set),
    /// including records the catalog no longer lists. The entry is flagged
    /// completed without consulting the catalog total.
    pub fn rebuild_all_watched(
        &mut self,
        seasons: &[SeasonEpisodeCount],
        increment: bool,
        now: DateTime<Utc>,
    ) {
        let mut rebuilt: BTreeMap<(u32, u32), EpisodeWatchRecord> = self
            .episodes
            .drain(..)
            .map(|mut existing| {
                if increment {
                    existing.rewatch(now);
                }
                ((existing.season_number, existing.episode_number), existing)
            })
            .collect();

        for season in seasons {
            for episode_number in 1..=season.episode_count {
                rebuilt
                    .entry((season.season_number, episode_number))
                    .or_insert_with(|| {
                        EpisodeWatchRecord::new(season.season_number, episode_number, now)
                    });
            }
        }

        self.episodes = rebuilt.into_values().collect();
        self.is_completed = true;
    }

    /// One undo step across every episode: counts above one are decremented,
    /// single views are removed.
    pub fn step_back(&mut self) {
        self.episodes.retain_mut(|episode| {
            if episode.count > 1 {
                episode.count -= 1;
                true
            } else {
                false
            }
        });
    }
}

/// Result of a single movie reset step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Decremented { remaining: u32 },
    Removed,
    Absent,
}

/// Result of an increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncrementOutcome {
    pub created: bool,
    pub left_watch_later: bool,
}

/// Result of the manual completion override
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOverride {
    Created,
    Updated,
    Removed,
    Unchanged,
}

/// Result of a series reset step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesResetOutcome {
    Stepped { remaining: usize },
    Removed,
    Absent,
}

/// Everything a single user has tracked
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserWatchState {
    pub user_id: String,
    #[serde(default)]
    pub watched_movies: Vec<WatchedMovieEntry>,
    #[serde(default)]
    pub watch_later: Vec<String>,
    #[serde(default)]
    pub watched_series: Vec<SeriesWatchedEntry>,
    #[serde(default)]
    pub series_watch_later: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl UserWatchState {
    /// Creates an empty record for a user
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            watched_movies: Vec::new(),
            watch_later: Vec::new(),
            watched_series: Vec::new(),
            series_watch_later: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn movie(&self, movie_id: &str) -> Option<&WatchedMovieEntry> {
        self.watched_movies.iter().find(|m| m.movie_id == movie_id)
    }

    /// Records one or more viewings of a movie and drops it from watch-later
    pub fn increment_movie(
        &mut self,
        movie_id: &str,
        duration: u32,
        batch: Vec<DateTime<Utc>>,
    ) -> IncrementOutcome {
        let created = match self
            .watched_movies
            .iter_mut()
            .find(|m| m.movie_id == movie_id)
        {
            Some(entry) => {
                entry.count = entry.count.saturating_add(batch_weight(&batch));
                entry.duration = duration;
                entry.merge_timestamps(batch);
                false
            }
            None => {
                self.watched_movies
                    .push(WatchedMovieEntry::new(movie_id.to_string(), duration, batch));
                true
            }
        };

        let left_watch_later = remove_member(&mut self.watch_later, movie_id);

        IncrementOutcome {
            created,
            left_watch_later,
        }
    }

    /// Undoes the most recent viewing of a movie
    pub fn reset_movie(&mut self, movie_id: &str) -> ResetOutcome {
        let Some(idx) = self
            .watched_movies
            .iter()
            .position(|m| m.movie_id == movie_id)
        else {
            return ResetOutcome::Absent;
        };

        let entry = &mut self.watched_movies[idx];
        if entry.count > 1 {
            entry.count -= 1;
            entry.watched_at.pop();
            ResetOutcome::Decremented {
                remaining: entry.count,
            }
        } else {
            self.watched_movies.remove(idx);
            ResetOutcome::Removed
        }
    }

    /// Returns true when the movie is now in watch-later
    pub fn toggle_movie_watch_later(&mut self, movie_id: &str) -> bool {
        toggle_member(&mut self.watch_later, movie_id)
    }

    /// Returns true when the series is now in watch-later
    pub fn toggle_series_watch_later(&mut self, series_id: &str) -> bool {
        toggle_member(&mut self.series_watch_later, series_id)
    }

    pub fn series(&self, series_id: &str) -> Option<&SeriesWatchedEntry> {
        self.watched_series.iter().find(|s| s.series_id == series_id)
    }

    pub fn series_mut(&mut self, series_id: &str) -> Option<&mut SeriesWatchedEntry> {
        self.watched_series
            .iter_mut()
            .find(|s| s.series_id == series_id)
    }

    /// Locates or lazily creates the entry for a series
    pub fn series_entry(&mut self, series_id: &str) -> &mut SeriesWatchedEntry {
        let idx = match self.series_position(series_id) {
            Some(idx) => idx,
            None => {
                self.watched_series.push(SeriesWatchedEntry::new(series_id));
                self.watched_series.len() - 1
            }
        };
        &mut self.watched_series[idx]
    }

    /// Deletes the series entry if it has no episodes left.
    ///
    /// Returns true when the entry was removed.
    pub fn prune_series(&mut self, series_id: &str) -> bool {
        let before = self.watched_series.len();
        self.watched_series
            .retain(|s| s.series_id != series_id || !s.episodes.is_empty());
        self.watched_series.len() != before
    }

    fn series_position(&self, series_id: &str) -> Option<usize> {
        self.watched_series
            .iter()
            .position(|s| s.series_id == series_id)
    }

    /// Manual completion override
    pub fn set_series_completed(&mut self, series_id: &str, is_completed: bool) -> CompletionOverride {
        match self.series_position(series_id) {
            None if is_completed => {
                self.series_entry(series_id).is_completed = true;
                CompletionOverride::Created
            }
            None => CompletionOverride::Unchanged,
            Some(idx) if !is_completed && self.watched_series[idx].episodes.is_empty() => {
                self.watched_series.remove(idx);
                CompletionOverride::Removed
            }
            Some(idx) => {
                self.watched_series[idx].is_completed = is_completed;
                CompletionOverride::Updated
            }
        }
    }

    /// One undo step for every episode of a series
    pub fn reset_series(&mut self, series_id: &str) -> SeriesResetOutcome {
        let Some(idx) = self.series_position(series_id) else {
            return SeriesResetOutcome::Absent;
        };

        let entry = &mut self.watched_series[idx];
        entry.step_back();
        if entry.episodes.is_empty() {
            self.watched_series.remove(idx);
            SeriesResetOutcome::Removed
        } else {
            entry.is_completed = false;
            SeriesResetOutcome::Stepped {
                remaining: entry.episodes.len(),
            }
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn toggle_member(set: &mut Vec<String>, id: &str) -> bool {
    if remove_member(set, id) {
        false
    } else {
        set.push(id.to_string());
        true
    }
}

fn remove_member(set: &mut Vec<String>, id: &str) -> bool {
    let before = set.len();
    set.retain(|member| member != id);
    set.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_increment_accumulates_count_and_merges_timestamps() {
        let mut state = UserWatchState::new("u1");
        state.increment_movie("603", 8160, vec![day(1)]);
        state.increment_movie("603", 8160, vec![day(2), day(3)]);

        let entry = state.movie("603").unwrap();
        assert_eq!(entry.count, 3);
        assert_eq!(entry.watched_at, vec![day(1), day(2), day(3)]);
    }

    #[test]
    fn test_increment_deduplicates_and_sorts_timestamps() {
        let mut state = UserWatchState::new("u1");
        state.increment_movie("603", 100, vec![day(5), day(2)]);
        state.increment_movie("603", 100, vec![day(2), day(1)]);

        let entry = state.movie("603").unwrap();
        assert_eq!(entry.watched_at, vec![day(1), day(2), day(5)]);
        // Duplicate timestamp still counts as a viewing
        assert_eq!(entry.count, 4);
    }

    #[test]
    fn test_increment_with_empty_batch_drifts_from_timestamps() {
        let mut state = UserWatchState::new("u1");
        let outcome = state.increment_movie("603", 100, vec![]);
        assert!(outcome.created);
        state.increment_movie("603", 100, vec![]);

        let entry = state.movie("603").unwrap();
        assert_eq!(entry.count, 2);
        assert!(entry.watched_at.is_empty());
    }

    #[test]
    fn test_increment_removes_from_watch_later() {
        let mut state = UserWatchState::new("u1");
        assert!(state.toggle_movie_watch_later("603"));

        let outcome = state.increment_movie("603", 100, vec![day(1)]);
        assert!(outcome.left_watch_later);
        assert!(!state.watch_later.contains(&"603".to_string()));
    }

    #[test]
    fn test_reset_is_a_single_step() {
        let mut state = UserWatchState::new("u1");
        state.increment_movie("603", 100, vec![day(1), day(2), day(3)]);

        assert_eq!(
            state.reset_movie("603"),
            ResetOutcome::Decremented { remaining: 2 }
        );
        let entry = state.movie("603").unwrap();
        assert_eq!(entry.count, 2);
        assert_eq!(entry.watched_at, vec![day(1), day(2)]);

        assert_eq!(
            state.reset_movie("603"),
            ResetOutcome::Decremented { remaining: 1 }
        );
        assert_eq!(state.reset_movie("603"), ResetOutcome::Removed);
        assert!(state.movie("603").is_none());
        assert_eq!(state.reset_movie("603"), ResetOutcome::Absent);
    }

    #[test]
    fn test_watch_later_toggle_round_trip() {
        let mut state = UserWatchState::new("u1");
        assert!(state.toggle_series_watch_later("1399"));
        assert!(!state.toggle_series_watch_later("1399"));
        assert!(state.series_watch_later.is_empty());
    }

    #[test]
    fn test_toggle_episode_alternates_without_force() {
        let mut entry = SeriesWatchedEntry::new("1399");
        assert_eq!(entry.toggle_episode(1, 1, false, day(1)), EpisodeToggle::Added);
        assert_eq!(entry.toggle_episode(1, 1, false, day(2)), EpisodeToggle::Removed);
        assert!(entry.episode(1, 1).is_none());
        assert_eq!(entry.toggle_episode(1, 1, false, day(3)), EpisodeToggle::Added);
        assert_eq!(entry.toggle_episode(1, 1, false, day(4)), EpisodeToggle::Removed);
        assert!(entry.episodes.is_empty());
    }

    #[test]
    fn test_toggle_episode_with_force_rewatches() {
        let mut entry = SeriesWatchedEntry::new("1399");
        entry.toggle_episode(1, 2, false, day(1));
        assert_eq!(entry.toggle_episode(1, 2, true, day(2)), EpisodeToggle::Rewatched);

        let record = entry.episode(1, 2).unwrap();
        assert_eq!(record.count, 2);
        assert_eq!(record.watched_at, day(2));
    }

    #[test]
    fn test_mark_episodes_respects_increment() {
        let mut entry = SeriesWatchedEntry::new("1399");
        entry.toggle_episode(1, 1, false, day(1));

        assert_eq!(entry.mark_episodes(1, &[1, 2, 3], false, day(2)), 2);
        assert_eq!(entry.episode(1, 1).unwrap().count, 1);
        assert_eq!(entry.mark_episodes(1, &[1, 2, 3], false, day(3)), 0);
        assert_eq!(entry.mark_episodes(1, &[1, 2], true, day(4)), 2);
        assert_eq!(entry.episode(1, 2).unwrap().count, 2);
    }

    #[test]
    fn test_rebuild_keeps_existing_counts_and_forces_completion() {
        let mut entry = SeriesWatchedEntry::new("1399");
        entry.toggle_episode(2, 1, false, day(1));
        entry.toggle_episode(2, 1, true, day(2));
        entry.toggle_episode(9, 9, false, day(1));

        let seasons = vec![
            SeasonEpisodeCount::new(1, 2),
            SeasonEpisodeCount::new(2, 1),
        ];
        entry.rebuild_all_watched(&seasons, false, day(3));

        let pairs: Vec<(u32, u32)> = entry
            .episodes
            .iter()
            .map(|e| (e.season_number, e.episode_number))
            .collect();
        assert_eq!(pairs, vec![(1, 1), (1, 2), (2, 1), (9, 9)]);
        assert_eq!(entry.episode(2, 1).unwrap().count, 2);
        assert!(entry.is_completed);
    }

    #[test]
    fn test_rebuild_with_increment_bumps_existing() {
        let mut entry = SeriesWatchedEntry::new("1399");
        entry.toggle_episode(1, 1, false, day(1));
        entry.rebuild_all_watched(&[SeasonEpisodeCount::new(1, 2)], true, day(2));

        assert_eq!(entry.episode(1, 1).unwrap().count, 2);
        assert_eq!(entry.episode(1, 2).unwrap().count, 1);
    }

    #[test]
    fn test_rebuild_with_repeated_season_keeps_one_record_per_episode() {
        let mut entry = SeriesWatchedEntry::new("1399");
        entry.toggle_episode(1, 2, false, day(1));
        let seasons = vec![
            SeasonEpisodeCount::new(1, 3),
            SeasonEpisodeCount::new(1, 3),
        ];
        entry.rebuild_all_watched(&seasons, true, day(2));

        assert_eq!(entry.watched_episode_count(), 3);
        assert_eq!(entry.episode(1, 2).unwrap().count, 2);
    }

    #[test]
    fn test_rebuild_of_long_series_is_complete_and_ordered() {
        let mut entry = SeriesWatchedEntry::new("long");
        entry.mark_episodes(3, &[10, 5], false, day(1));
        let seasons: Vec<SeasonEpisodeCount> = (1..=20)
            .map(|season| SeasonEpisodeCount::new(season, 1_000))
            .collect();

        entry.rebuild_all_watched(&seasons, false, day(2));

        assert_eq!(entry.watched_episode_count(), 20_000);
        assert!(entry
            .episodes
            .windows(2)
            .all(|w| (w[0].season_number, w[0].episode_number)
                < (w[1].season_number, w[1].episode_number)));
        assert_eq!(entry.episode(3, 10).unwrap().watched_at, day(1));
    }

    #[test]
    fn test_mark_episodes_with_repeated_numbers() {
        let mut entry = SeriesWatchedEntry::new("1399");
        assert_eq!(entry.mark_episodes(1, &[4, 4, 5], false, day(1)), 2);
        assert_eq!(entry.watched_episode_count(), 2);
        assert_eq!(entry.episode(1, 4).unwrap().count, 1);
    }

    #[test]
    fn test_set_series_completed_lifecycle() {
        let mut state = UserWatchState::new("u1");
        assert_eq!(
            state.set_series_completed("1399", false),
            CompletionOverride::Unchanged
        );
        assert_eq!(
            state.set_series_completed("1399", true),
            CompletionOverride::Created
        );
        assert!(state.series("1399").unwrap().is_completed);
        assert_eq!(
            state.set_series_completed("1399", false),
            CompletionOverride::Removed
        );
        assert!(state.series("1399").is_none());

        state.series_entry("1399").toggle_episode(1, 1, false, day(1));
        assert_eq!(
            state.set_series_completed("1399", true),
            CompletionOverride::Updated
        );
        assert_eq!(
            state.set_series_completed("1399", false),
            CompletionOverride::Updated
        );
        assert!(!state.series("1399").unwrap().is_completed);
    }

    #[test]
    fn test_reset_series_steps_back_each_episode() {
        let mut state = UserWatchState::new("u1");
        {
            let entry = state.series_entry("1399");
            entry.toggle_episode(1, 1, false, day(1));
            entry.toggle_episode(1, 1, true, day(2));
            entry.toggle_episode(1, 2, false, day(1));
            entry.is_completed = true;
        }

        assert_eq!(
            state.reset_series("1399"),
            SeriesResetOutcome::Stepped { remaining: 1 }
        );
        let entry = state.series("1399").unwrap();
        assert_eq!(entry.episode(1, 1).unwrap().count, 1);
        assert!(!entry.is_completed);

        assert_eq!(state.reset_series("1399"), SeriesResetOutcome::Removed);
        assert_eq!(state.reset_series("1399"), SeriesResetOutcome::Absent);
    }

    #[test]
    fn test_prune_only_removes_empty_entries() {
        let mut state = UserWatchState::new("u1");
        state.series_entry("a");
        state.series_entry("b").toggle_episode(1, 1, false, day(1));

        assert!(state.prune_series("a"));
        assert!(!state.prune_series("b"));
        assert!(state.series("b").is_some());
    }
}
