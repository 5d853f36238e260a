use std::path::PathBuf;

pub const SERVER_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "client/dist";

pub const DEFAULT_CACHE_TTL_SECS: i64 = 600; // 10 minutes
pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 50_000;
pub const CACHE_EVICTION_INTERVAL_SECS: u64 = 60;

/// Cache policy for cell info responses.
pub const INFO_CACHE_CONTROL: &str = "public, max-age=60";

pub fn server_port() -> u16 {
    std::env::var("HEXMAP_PORT")
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(SERVER_PORT)
}

pub fn static_dir() -> PathBuf {
    std::env::var("HEXMAP_STATIC_DIR")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR))
}

pub fn seed_file() -> Option<PathBuf> {
    std::env::var("HEXMAP_SEED_FILE")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

pub fn cache_ttl_secs() -> i64 {
    std::env::var("HEXMAP_CACHE_TTL_SECS")
        .ok()
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_CACHE_TTL_SECS)
}

pub fn max_cache_entries() -> usize {
    std::env::var("HEXMAP_MAX_CACHE_ENTRIES")
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_MAX_CACHE_ENTRIES)
}
