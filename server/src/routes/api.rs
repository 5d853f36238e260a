use std::fmt::Write as _;

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use chrono::Utc;
use h3o::CellIndex;
use hexmap_shared::resolution::{FINEST_RESOLUTION, MIN_RESOLUTION};
use hexmap_shared::{PolygonRecord, ResourceInfo};

use crate::config::INFO_CACHE_CONTROL;
use crate::state::{AppState, CachedInfo, ObservabilitySnapshot};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
const MAX_CELL_ID_LEN: usize = 32;

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let observability = state.observability.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "seeded_cells": state.seeded.len(),
        "cache_size": state.info_cache.len(),
        "cache_ttl_secs": state.cache_ttl_secs,
        "uptime_secs": state.uptime_secs(),
        "observability": {
            "info_requests_total": observability.info_requests_total,
            "info_seeded_hits_total": observability.info_seeded_hits_total,
            "info_cache_hits_total": observability.info_cache_hits_total,
            "info_generated_total": observability.info_generated_total,
            "invalid_requests_total": observability.invalid_requests_total,
            "polygon_list_requests_total": observability.polygon_list_requests_total,
            "cache_evictions_total": observability.cache_evictions_total,
        }
    }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = render_prometheus_metrics(
        state.seeded.len(),
        state.info_cache.len(),
        state.observability.snapshot(),
    );

    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn render_prometheus_metrics(
    seeded_cells: usize,
    cache_size: usize,
    observability: ObservabilitySnapshot,
) -> String {
    let gauges = [
        (
            "hexmap_seeded_cells",
            "Cells loaded from the seed file.",
            seeded_cells as u64,
        ),
        (
            "hexmap_info_cache_size",
            "Generated cell info entries currently cached.",
            cache_size as u64,
        ),
    ];
    let counters = [
        (
            "hexmap_info_requests_total",
            "Cell info requests received.",
            observability.info_requests_total,
        ),
        (
            "hexmap_info_seeded_hits_total",
            "Cell info requests answered from seeded cells.",
            observability.info_seeded_hits_total,
        ),
        (
            "hexmap_info_cache_hits_total",
            "Cell info requests answered from the cache.",
            observability.info_cache_hits_total,
        ),
        (
            "hexmap_info_generated_total",
            "Cell info entries generated on demand.",
            observability.info_generated_total,
        ),
        (
            "hexmap_invalid_requests_total",
            "Cell info requests rejected as malformed.",
            observability.invalid_requests_total,
        ),
        (
            "hexmap_polygon_list_requests_total",
            "Polygon listing requests received.",
            observability.polygon_list_requests_total,
        ),
        (
            "hexmap_cache_evictions_total",
            "Generated entries evicted from the cache.",
            observability.cache_evictions_total,
        ),
    ];

    let mut body = String::new();
    for (name, help, value) in gauges {
        let _ = writeln!(body, "# HELP {name} {help}");
        let _ = writeln!(body, "# TYPE {name} gauge");
        let _ = writeln!(body, "{name} {value}");
    }
    for (name, help, value) in counters {
        let _ = writeln!(body, "# HELP {name} {help}");
        let _ = writeln!(body, "# TYPE {name} counter");
        let _ = writeln!(body, "{name} {value}");
    }
    body
}

/// `GET /api/polygon/{cell}/info`: finest-resolution cells only.
pub async fn get_cell_info(
    State(state): State<AppState>,
    Path(raw_cell): Path<String>,
) -> Result<Response, StatusCode> {
    state.observability.record_info_request();
    let cell = resolve_cell(&raw_cell, FINEST_RESOLUTION)
        .inspect_err(|_| state.observability.record_invalid_request())?;
    info_response(&state, cell)
}

/// `GET /api/polygon/{resolution}/{cell}/info`: coarser grid levels only;
/// finest cells use the short path.
pub async fn get_cell_info_at_resolution(
    State(state): State<AppState>,
    Path((resolution, raw_cell)): Path<(u8, String)>,
) -> Result<Response, StatusCode> {
    state.observability.record_info_request();
    let cell = coarse_resolution(resolution)
        .and_then(|resolution| resolve_cell(&raw_cell, resolution))
        .inspect_err(|_| state.observability.record_invalid_request())?;
    info_response(&state, cell)
}

/// `GET /api/polygons`: every seeded cell, sorted by id.
pub async fn list_polygons(State(state): State<AppState>) -> Json<Vec<PolygonRecord>> {
    state.observability.record_polygon_list_request();
    let mut records: Vec<PolygonRecord> = state
        .seeded
        .iter()
        .map(|entry| PolygonRecord {
            id: entry.key().clone(),
            resolution: Some(entry.value().resolution),
        })
        .collect();
    records.sort_by(|a, b| a.id.cmp(&b.id));
    Json(records)
}

fn parse_cell(raw: &str) -> Result<CellIndex, StatusCode> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_CELL_ID_LEN {
        return Err(StatusCode::BAD_REQUEST);
    }
    trimmed
        .parse::<CellIndex>()
        .map_err(|_| StatusCode::BAD_REQUEST)
}

fn coarse_resolution(resolution: u8) -> Result<u8, StatusCode> {
    if (MIN_RESOLUTION..FINEST_RESOLUTION).contains(&resolution) {
        Ok(resolution)
    } else {
        Err(StatusCode::BAD_REQUEST)
    }
}

/// Parse a cell id and require it to sit at `resolution`.
fn resolve_cell(raw: &str, resolution: u8) -> Result<CellIndex, StatusCode> {
    let cell = parse_cell(raw)?;
    if u8::from(cell.resolution()) != resolution {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(cell)
}

fn info_response(state: &AppState, cell: CellIndex) -> Result<Response, StatusCode> {
    let info = lookup_info(state, cell);
    let body = serde_json::to_vec(&info).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(json_bytes_response(Bytes::from(body), INFO_CACHE_CONTROL))
}

/// Seeded record, else a fresh cached one, else generate and cache.
fn lookup_info(state: &AppState, cell: CellIndex) -> ResourceInfo {
    let key = cell.to_string();

    let seeded = state.seeded.get(&key).map(|entry| entry.value().info);
    if let Some(info) = seeded {
        state.observability.record_seeded_hit();
        return info;
    }

    let now = Utc::now();
    let cached = state.info_cache.get(&key).map(|entry| *entry.value());
    if let Some(cached) = cached
        && state.is_fresh(&cached, now)
    {
        state.observability.record_cache_hit();
        return cached.info;
    }

    let info = ResourceInfo::seeded(u8::from(cell.resolution()), &key);
    cache_info(state, key, info);
    state.observability.record_generated();
    info
}

fn cache_info(state: &AppState, key: String, info: ResourceInfo) {
    if !state.info_cache.contains_key(&key) {
        while state.info_cache.len() >= state.max_cache_entries {
            if !evict_oldest_info_entry(state) {
                break;
            }
        }
    }

    state.info_cache.insert(
        key,
        CachedInfo {
            info,
            cached_at: Utc::now(),
        },
    );
}

fn evict_oldest_info_entry(state: &AppState) -> bool {
    let Some(oldest_key) = state
        .info_cache
        .iter()
        .min_by_key(|entry| entry.value().cached_at)
        .map(|entry| entry.key().clone())
    else {
        return false;
    };
    let removed = state.info_cache.remove(&oldest_key).is_some();
    if removed {
        state.observability.record_cache_evictions(1);
    }
    removed
}

fn json_bytes_response(body: Bytes, cache_control: &'static str) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    response
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::str::FromStr;

    use h3o::{LatLng, Resolution};
    use hexmap_shared::polygon_info_path;

    use super::*;
    use crate::state::SeededCell;

    async fn spawn_test_server(state: AppState) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let app = crate::app::build_app(state);
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve test app");
        });
        (addr, handle)
    }

    fn cell_at(resolution: Resolution) -> CellIndex {
        LatLng::new(55.7558, 37.6173)
            .expect("valid coordinate")
            .to_cell(resolution)
    }

    #[test]
    fn metrics_output_contains_prometheus_help_type_and_values() {
        let observability = ObservabilitySnapshot {
            info_requests_total: 12,
            info_seeded_hits_total: 3,
            info_cache_hits_total: 4,
            info_generated_total: 5,
            invalid_requests_total: 2,
            polygon_list_requests_total: 1,
            cache_evictions_total: 9,
        };

        let metrics = render_prometheus_metrics(42, 7, observability);

        assert!(metrics.contains("# HELP hexmap_seeded_cells"));
        assert!(metrics.contains("# TYPE hexmap_seeded_cells gauge"));
        assert!(metrics.contains("# TYPE hexmap_info_requests_total counter"));
        assert!(metrics.contains("hexmap_seeded_cells 42"));
        assert!(metrics.contains("hexmap_info_cache_size 7"));
        assert!(metrics.contains("hexmap_info_requests_total 12"));
        assert!(metrics.contains("hexmap_info_seeded_hits_total 3"));
        assert!(metrics.contains("hexmap_info_cache_hits_total 4"));
        assert!(metrics.contains("hexmap_info_generated_total 5"));
        assert!(metrics.contains("hexmap_invalid_requests_total 2"));
        assert!(metrics.contains("hexmap_polygon_list_requests_total 1"));
        assert!(metrics.contains("hexmap_cache_evictions_total 9"));
    }

    #[test]
    fn resolve_cell_rejects_malformed_and_mismatched_ids() {
        let fine = cell_at(Resolution::Ten).to_string();
        assert!(resolve_cell(&fine, 10).is_ok());
        assert_eq!(resolve_cell(&fine, 7), Err(StatusCode::BAD_REQUEST));
        assert_eq!(resolve_cell("", 10), Err(StatusCode::BAD_REQUEST));
        assert_eq!(resolve_cell("not-a-cell", 10), Err(StatusCode::BAD_REQUEST));
        assert_eq!(
            resolve_cell(&"f".repeat(64), 10),
            Err(StatusCode::BAD_REQUEST)
        );
    }

    #[test]
    fn long_path_accepts_only_coarse_grid_levels() {
        assert_eq!(coarse_resolution(5), Ok(5));
        assert_eq!(coarse_resolution(9), Ok(9));
        for resolution in [0, 3, 4, 10, 15, 200] {
            assert_eq!(
                coarse_resolution(resolution),
                Err(StatusCode::BAD_REQUEST),
                "resolution {resolution}"
            );
        }
    }

    #[test]
    fn lookup_prefers_seeded_then_cache_then_generates() {
        let state = AppState::with_cache_limits(600, 10);
        let seeded = cell_at(Resolution::Seven);
        let seeded_info = ResourceInfo {
            gold: 1.0,
            wood: 2.0,
            ore: 3.0,
        };
        state.seeded.insert(
            seeded.to_string(),
            SeededCell {
                resolution: 7,
                info: seeded_info,
            },
        );

        assert_eq!(lookup_info(&state, seeded), seeded_info);
        assert!(state.info_cache.is_empty());

        let other = cell_at(Resolution::Eight);
        let generated = lookup_info(&state, other);
        assert_eq!(generated, ResourceInfo::seeded(8, &other.to_string()));
        assert_eq!(lookup_info(&state, other), generated);

        let snapshot = state.observability.snapshot();
        assert_eq!(snapshot.info_seeded_hits_total, 1);
        assert_eq!(snapshot.info_generated_total, 1);
        assert_eq!(snapshot.info_cache_hits_total, 1);
    }

    #[test]
    fn cache_is_bounded_by_evicting_oldest() {
        let state = AppState::with_cache_limits(600, 2);
        let cells = [
            cell_at(Resolution::Five),
            cell_at(Resolution::Six),
            cell_at(Resolution::Seven),
        ];
        lookup_info(&state, cells[0]);
        lookup_info(&state, cells[1]);
        if let Some(mut oldest) = state.info_cache.get_mut(&cells[0].to_string()) {
            oldest.cached_at -= chrono::TimeDelta::seconds(30);
        }
        lookup_info(&state, cells[2]);

        assert_eq!(state.info_cache.len(), 2);
        assert!(!state.info_cache.contains_key(&cells[0].to_string()));
        assert_eq!(state.observability.snapshot().cache_evictions_total, 1);
    }

    #[tokio::test]
    async fn info_routes_serve_resolution_specific_paths() {
        let state = AppState::with_cache_limits(600, 100);
        let seeded = cell_at(Resolution::Ten);
        let seeded_info = ResourceInfo {
            gold: 10.0,
            wood: 20.0,
            ore: 30.0,
        };
        state.seeded.insert(
            seeded.to_string(),
            SeededCell {
                resolution: 10,
                info: seeded_info,
            },
        );

        let (addr, server_handle) = spawn_test_server(state).await;
        let base_url = format!("http://{addr}");
        let client = reqwest::Client::new();

        let fine = client
            .get(format!(
                "{base_url}{}",
                polygon_info_path(10, &seeded.to_string())
            ))
            .send()
            .await
            .expect("fine info request")
            .error_for_status()
            .expect("fine info status");
        assert_eq!(
            fine.headers()
                .get(reqwest::header::CACHE_CONTROL)
                .and_then(|value| value.to_str().ok()),
            Some(INFO_CACHE_CONTROL)
        );
        let fine: ResourceInfo = fine.json().await.expect("parse fine info");
        assert_eq!(fine, seeded_info);

        let coarse_cell = cell_at(Resolution::Seven).to_string();
        let coarse: ResourceInfo = client
            .get(format!("{base_url}{}", polygon_info_path(7, &coarse_cell)))
            .send()
            .await
            .expect("coarse info request")
            .error_for_status()
            .expect("coarse info status")
            .json()
            .await
            .expect("parse coarse info");
        assert_eq!(coarse, ResourceInfo::seeded(7, &coarse_cell));

        server_handle.abort();
        let _ = server_handle.await;
    }

    #[tokio::test]
    async fn info_routes_reject_bad_requests() {
        let (addr, server_handle) = spawn_test_server(AppState::with_cache_limits(600, 100)).await;
        let base_url = format!("http://{addr}");
        let client = reqwest::Client::new();
        let coarse_cell = cell_at(Resolution::Seven).to_string();
        let continental_cell = cell_at(Resolution::Three).to_string();
        let fine_cell = cell_at(Resolution::Ten).to_string();

        for path in [
            "/api/polygon/zzzz/info".to_owned(),
            format!("/api/polygon/{coarse_cell}/info"),
            format!("/api/polygon/8/{coarse_cell}/info"),
            format!("/api/polygon/abc/{coarse_cell}/info"),
            format!("/api/polygon/3/{continental_cell}/info"),
            format!("/api/polygon/10/{fine_cell}/info"),
        ] {
            let status = client
                .get(format!("{base_url}{path}"))
                .send()
                .await
                .expect("bad info request")
                .status();
            assert_eq!(status, reqwest::StatusCode::BAD_REQUEST, "{path}");
        }

        server_handle.abort();
        let _ = server_handle.await;
    }

    #[tokio::test]
    async fn polygons_health_and_metrics_expose_expected_contract() {
        let state = AppState::with_cache_limits(600, 100);
        for res in [Resolution::Nine, Resolution::Six] {
            let cell = cell_at(res);
            state.seeded.insert(
                cell.to_string(),
                SeededCell {
                    resolution: u8::from(res),
                    info: ResourceInfo::default(),
                },
            );
        }

        let (addr, server_handle) = spawn_test_server(state).await;
        let base_url = format!("http://{addr}");
        let client = reqwest::Client::new();

        let records = client
            .get(format!("{base_url}{}", hexmap_shared::POLYGONS_PATH))
            .send()
            .await
            .expect("polygons request")
            .error_for_status()
            .expect("polygons status")
            .json::<Vec<PolygonRecord>>()
            .await
            .expect("parse polygons");
        assert_eq!(records.len(), 2);
        assert!(records.windows(2).all(|w| w[0].id <= w[1].id));
        for record in &records {
            let cell = CellIndex::from_str(&record.id).expect("listed id is a cell");
            assert_eq!(record.resolution, Some(u8::from(cell.resolution())));
        }

        let health = client
            .get(format!("{base_url}/api/health"))
            .send()
            .await
            .expect("health request")
            .error_for_status()
            .expect("health status")
            .json::<serde_json::Value>()
            .await
            .expect("parse health");

        assert_eq!(health.get("status").and_then(|v| v.as_str()), Some("ok"));
        assert_eq!(health.get("seeded_cells").and_then(|v| v.as_u64()), Some(2));
        assert_eq!(
            health
                .get("observability")
                .and_then(|v| v.get("polygon_list_requests_total"))
                .and_then(|v| v.as_u64()),
            Some(1)
        );

        let metrics = client
            .get(format!("{base_url}/api/metrics"))
            .send()
            .await
            .expect("metrics request")
            .error_for_status()
            .expect("metrics status")
            .text()
            .await
            .expect("parse metrics text");

        assert!(metrics.contains("# TYPE hexmap_info_requests_total counter"));
        assert!(metrics.contains("hexmap_seeded_cells 2"));
        assert!(metrics.contains("hexmap_polygon_list_requests_total 1"));

        server_handle.abort();
        let _ = server_handle.await;
    }
}
