use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use hexmap_shared::ResourceInfo;

use crate::config::{cache_ttl_secs, max_cache_entries};

/// A cell loaded from the seed file. Never evicted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeededCell {
    pub resolution: u8,
    pub info: ResourceInfo,
}

/// A generated entry, evicted once older than the cache TTL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedInfo {
    pub info: ResourceInfo,
    pub cached_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AppState {
    /// Canonical cell id -> seeded record.
    pub seeded: Arc<DashMap<String, SeededCell>>,
    /// Canonical cell id -> generated record.
    pub info_cache: Arc<DashMap<String, CachedInfo>>,
    pub cache_ttl_secs: i64,
    pub max_cache_entries: usize,
    pub started_at: DateTime<Utc>,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    info_requests_total: AtomicU64,
    info_seeded_hits_total: AtomicU64,
    info_cache_hits_total: AtomicU64,
    info_generated_total: AtomicU64,
    invalid_requests_total: AtomicU64,
    polygon_list_requests_total: AtomicU64,
    cache_evictions_total: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ObservabilitySnapshot {
    pub info_requests_total: u64,
    pub info_seeded_hits_total: u64,
    pub info_cache_hits_total: u64,
    pub info_generated_total: u64,
    pub invalid_requests_total: u64,
    pub polygon_list_requests_total: u64,
    pub cache_evictions_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            info_requests_total: self.info_requests_total.load(Ordering::Relaxed),
            info_seeded_hits_total: self.info_seeded_hits_total.load(Ordering::Relaxed),
            info_cache_hits_total: self.info_cache_hits_total.load(Ordering::Relaxed),
            info_generated_total: self.info_generated_total.load(Ordering::Relaxed),
            invalid_requests_total: self.invalid_requests_total.load(Ordering::Relaxed),
            polygon_list_requests_total: self
                .polygon_list_requests_total
                .load(Ordering::Relaxed),
            cache_evictions_total: self.cache_evictions_total.load(Ordering::Relaxed),
        }
    }

    pub fn record_info_request(&self) {
        self.info_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_seeded_hit(&self) {
        self.info_seeded_hits_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.info_cache_hits_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_generated(&self) {
        self.info_generated_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid_request(&self) {
        self.invalid_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_polygon_list_request(&self) {
        self.polygon_list_requests_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_evictions(&self, count: u64) {
        self.cache_evictions_total
            .fetch_add(count, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_cache_limits(cache_ttl_secs(), max_cache_entries())
    }

    pub fn with_cache_limits(cache_ttl_secs: i64, max_cache_entries: usize) -> Self {
        Self {
            seeded: Arc::new(DashMap::new()),
            info_cache: Arc::new(DashMap::new()),
            cache_ttl_secs,
            max_cache_entries: max_cache_entries.max(1),
            started_at: Utc::now(),
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }

    pub fn uptime_secs(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
            .max(0)
    }

    pub fn is_fresh(&self, cached: &CachedInfo, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(cached.cached_at).num_seconds() < self.cache_ttl_secs
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
