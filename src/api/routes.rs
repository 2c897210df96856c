use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers::{self, movies, series};
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(handlers::register_user))
        .route("/status", get(handlers::get_status))
        // Movies
        .route(
            "/movies/:movie_id/watched",
            post(movies::increment_watched).delete(movies::reset_watched),
        )
        .route("/movies/:movie_id/watch-later", post(movies::toggle_watch_later))
        // Series
        .route("/series/:series_id/episodes", post(series::toggle_episode))
        .route(
            "/series/:series_id/seasons/:season_number",
            post(series::mark_season),
        )
        .route(
            "/series/:series_id/watched",
            post(series::mark_all).delete(series::reset),
        )
        .route("/series/:series_id/completed", put(series::set_completed))
        .route("/series/:series_id/watch-later", post(series::toggle_watch_later))
        .route("/series/:series_id/progress", get(series::progress))
}
