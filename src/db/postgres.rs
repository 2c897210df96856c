use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};

use crate::{
    error::{AppError, AppResult},
    models::UserWatchState,
};

use super::WatchStateRepository;

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Stores each user's watch state as one JSONB document
#[derive(Clone)]
pub struct PgWatchStateRepository {
    pool: PgPool,
}

impl PgWatchStateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl WatchStateRepository for PgWatchStateRepository {
    async fn create_user(&self, user_id: &str) -> AppResult<UserWatchState> {
        let empty = UserWatchState::new(user_id);

        sqlx::query(
            r#"
            INSERT INTO user_watch_state (user_id, document, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(Json(&empty))
        .bind(empty.updated_at)
        .execute(&self.pool)
        .await?;

        self.load(user_id)
            .await?
            .ok_or_else(|| AppError::Persist(format!("record for {} vanished after insert", user_id)))
    }

    async fn load(&self, user_id: &str) -> AppResult<Option<UserWatchState>> {
        let row: Option<(Json<UserWatchState>,)> = sqlx::query_as(
            r#"
            SELECT document
            FROM user_watch_state
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(Json(state),)| state))
    }

    async fn save(&self, state: &UserWatchState) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE user_watch_state
            SET document = $2, updated_at = $3
            WHERE user_id = $1
            "#,
        )
        .bind(&state.user_id)
        .bind(Json(state))
        .bind(state.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound(state.user_id.clone()));
        }

        tracing::debug!(user_id = %state.user_id, "Persisted watch state");
        Ok(())
    }
}
