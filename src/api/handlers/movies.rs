use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{api::AppState, api::AuthUser, error::AppResult, models::WatchedMovieEntry};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncrementWatchedRequest {
    /// Runtime in seconds
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub watched_at: Vec<DateTime<Utc>>,
}

pub async fn increment_watched(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(movie_id): Path<String>,
    Json(request): Json<IncrementWatchedRequest>,
) -> AppResult<Json<Vec<WatchedMovieEntry>>> {
    let watched = state
        .movies
        .increment_watched(&user_id, &movie_id, request.duration, request.watched_at)
        .await?;
    Ok(Json(watched))
}

pub async fn reset_watched(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(movie_id): Path<String>,
) -> AppResult<Json<Vec<WatchedMovieEntry>>> {
    let watched = state.movies.reset_watched(&user_id, &movie_id).await?;
    Ok(Json(watched))
}

pub async fn toggle_watch_later(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(movie_id): Path<String>,
) -> AppResult<Json<Vec<String>>> {
    let watch_later = state.movies.toggle_watch_later(&user_id, &movie_id).await?;
    Ok(Json(watch_later))
}
