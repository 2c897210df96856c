use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Episode catalog fetch failed: {0}")]
    CatalogFetchFailed(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Persist failed: {0}")]
    Persist(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable, machine-readable error kind exposed to callers
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::UserNotFound(_) => "user_not_found",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::CatalogFetchFailed(_) => "catalog_fetch_failed",
            AppError::ExternalApi(_) | AppError::HttpClient(_) => "upstream_unavailable",
            AppError::Database(_) | AppError::Persist(_) => "persist_failed",
            AppError::Cache(_) => "cache_error",
            AppError::Internal(_) => "internal",
        }
    }

    /// Wraps any upstream failure as a hard catalog failure
    pub fn catalog(err: AppError) -> AppError {
        match err {
            AppError::CatalogFetchFailed(_) => err,
            other => AppError::CatalogFetchFailed(other.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UserNotFound(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::CatalogFetchFailed(_) | AppError::ExternalApi(_) | AppError::HttpClient(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Database(_)
            | AppError::Persist(_)
            | AppError::Cache(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::UserNotFound(msg)
            | AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::InvalidInput(msg)
            | AppError::CatalogFetchFailed(msg)
            | AppError::ExternalApi(msg) => msg.clone(),
            _ => self.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "kind": self.kind(),
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
