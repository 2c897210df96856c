mod auth;
pub mod handlers;
mod routes;
mod state;

pub use auth::{AuthUser, USER_ID_HEADER};
pub use routes::create_router;
pub use state::AppState;
