/// Read-through caching on top of [`Cache`](crate::db::Cache).
///
/// Returns the cached value for `$key` if present. Otherwise awaits `$block`,
/// queues the result for the background writer with `$ttl` seconds, and
/// returns it. Must be used inside a function returning `AppResult`.
///
/// # Example
/// ```rust,ignore
/// let seasons: Vec<SeasonSummary> = cached!(cache, CacheKey::Seasons(id), ttl, async move {
///     fetch_seasons(&id).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        if let Some(cached) = $cache.get_from_cache(&key).await? {
            tracing::debug!(key = %key, "Cache hit");
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&key, &value, $ttl);
            Ok(value)
        }
    }};
}
