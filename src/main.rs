use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use watchsync_api::{
    api::{create_router, AppState},
    config::Config,
    db::{create_pool, create_redis_client, run_migrations, Cache, PgWatchStateRepository},
    events::BroadcastHub,
    services::{providers::TmdbClient, RedisMediaCache},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "watchsync_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = Cache::new(redis_client);

    let tmdb = Arc::new(TmdbClient::new(
        cache.clone(),
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.catalog_cache_ttl_secs,
    ));
    let media = Arc::new(RedisMediaCache::new(
        cache,
        tmdb.clone(),
        config.media_cache_ttl_secs,
    ));
    let hub = Arc::new(BroadcastHub::new(config.event_channel_capacity));

    let state = AppState::new(
        Arc::new(PgWatchStateRepository::new(pool)),
        media,
        tmdb,
        hub,
    );
    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Flush pending cache writes before exit
    cache_writer.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
