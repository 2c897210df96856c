use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;

use crate::{
    api::{AppState, AuthUser},
    error::{AppError, AppResult},
    models::{SeasonEpisodeCount, SeriesProgress, SeriesWatchedEntry},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleEpisodeRequest {
    pub season_number: u32,
    pub episode_number: u32,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkSeasonRequest {
    /// Episode numbers; fetched from the catalog when absent
    #[serde(default)]
    pub episodes: Option<Vec<u32>>,
    #[serde(default)]
    pub increment: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllRequest {
    /// Season table; fetched from the catalog when absent
    #[serde(default)]
    pub seasons: Option<Vec<SeasonEpisodeCount>>,
    #[serde(default)]
    pub increment: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCompletedRequest {
    pub is_completed: bool,
}

/// Reads an optional JSON body; a request sent without one gets the defaults.
fn body_or_default<T: Default>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    match body {
        Ok(Json(request)) => Ok(request),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(AppError::InvalidInput(rejection.body_text())),
    }
}

pub async fn toggle_episode(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(series_id): Path<String>,
    Json(request): Json<ToggleEpisodeRequest>,
) -> AppResult<Json<Vec<SeriesWatchedEntry>>> {
    let series = state
        .series
        .toggle_episode_watched(
            &user_id,
            &series_id,
            request.season_number,
            request.episode_number,
            request.force,
        )
        .await?;
    Ok(Json(series))
}

pub async fn mark_season(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((series_id, season_number)): Path<(String, u32)>,
    body: Result<Json<MarkSeasonRequest>, JsonRejection>,
) -> AppResult<Json<Vec<SeriesWatchedEntry>>> {
    let request = body_or_default(body)?;
    let series = state
        .series
        .mark_season_watched(
            &user_id,
            &series_id,
            season_number,
            request.episodes,
            request.increment,
        )
        .await?;
    Ok(Json(series))
}

pub async fn mark_all(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(series_id): Path<String>,
    body: Result<Json<MarkAllRequest>, JsonRejection>,
) -> AppResult<Json<Vec<SeriesWatchedEntry>>> {
    let request = body_or_default(body)?;
    let series = state
        .series
        .mark_all_episodes_watched(&user_id, &series_id, request.seasons, request.increment)
        .await?;
    Ok(Json(series))
}

pub async fn reset(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(series_id): Path<String>,
) -> AppResult<Json<Vec<SeriesWatchedEntry>>> {
    let series = state
        .series
        .reset_series_watched(&user_id, &series_id)
        .await?;
    Ok(Json(series))
}

pub async fn set_completed(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(series_id): Path<String>,
    Json(request): Json<SetCompletedRequest>,
) -> AppResult<Json<Vec<SeriesWatchedEntry>>> {
    let series = state
        .series
        .toggle_series_completed(&user_id, &series_id, request.is_completed)
        .await?;
    Ok(Json(series))
}

pub async fn toggle_watch_later(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(series_id): Path<String>,
) -> AppResult<Json<Vec<String>>> {
    let watch_later = state
        .series
        .toggle_series_watch_later(&user_id, &series_id)
        .await?;
    Ok(Json(watch_later))
}

pub async fn progress(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(series_id): Path<String>,
) -> AppResult<Json<SeriesProgress>> {
    let progress = state
        .series
        .get_series_progress(&user_id, &series_id)
        .await?;
    Ok(Json(progress))
}
