use axum::{extract::State, http::StatusCode, http::Uri, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::WatchStatus,
};

use super::{AppState, AuthUser};

pub mod movies;
pub mod series;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: String,
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Unknown routes answer with the standard error body
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}

/// Creates an empty watch-state record for the caller (idempotent)
pub async fn register_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let record = state.repo.create_user(&user_id).await?;
    tracing::info!(user_id = %record.user_id, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            user_id: record.user_id,
        }),
    ))
}

/// Full enriched status, used by clients to resynchronize
pub async fn get_status(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<WatchStatus>> {
    let status = state.movies.get_status(&user_id).await?;
    Ok(Json(status))
}
