use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::CACHE_EVICTION_INTERVAL_SECS;
use crate::state::AppState;

pub async fn run(state: AppState) {
    let mut interval = tokio::time::interval(Duration::from_secs(CACHE_EVICTION_INTERVAL_SECS));

    loop {
        interval.tick().await;

        let evicted = evict_expired(&state, Utc::now());
        if evicted > 0 {
            info!(
                "evicted {evicted} stale cell info entries ({} remaining)",
                state.info_cache.len()
            );
        }
    }
}

/// Drop every generated entry older than the TTL. Returns how many went.
pub fn evict_expired(state: &AppState, now: DateTime<Utc>) -> usize {
    let before = state.info_cache.len();
    state
        .info_cache
        .retain(|_, cached| state.is_fresh(cached, now));
    let evicted = before.saturating_sub(state.info_cache.len());
    state.observability.record_cache_evictions(evicted as u64);
    evicted
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use hexmap_shared::ResourceInfo;

    use super::*;
    use crate::state::CachedInfo;

    #[test]
    fn only_expired_entries_are_evicted() {
        let state = AppState::with_cache_limits(60, 100);
        let now = Utc::now();
        let entry = |age_secs: i64| CachedInfo {
            info: ResourceInfo::default(),
            cached_at: now - TimeDelta::seconds(age_secs),
        };
        state.info_cache.insert("fresh".into(), entry(5));
        state.info_cache.insert("edge".into(), entry(60));
        state.info_cache.insert("stale".into(), entry(600));

        assert_eq!(evict_expired(&state, now), 2);
        assert!(state.info_cache.contains_key("fresh"));
        assert_eq!(state.info_cache.len(), 1);
        assert_eq!(state.observability.snapshot().cache_evictions_total, 2);

        assert_eq!(evict_expired(&state, now), 0);
    }
}
