use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Header carrying the authenticated user id, set by the upstream gateway
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated caller; every watch-state operation acts on this user only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| AuthUser(id.to_string()))
            .ok_or_else(|| AppError::Unauthorized(format!("missing {} header", USER_ID_HEADER)))
    }
}
