use std::path::Path;

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::routes;
use crate::state::AppState;

pub(crate) fn build_app(state: AppState) -> Router {
    build_app_with_static(state, &crate::config::static_dir())
}

pub(crate) fn build_app_with_static(state: AppState, static_dir: &Path) -> Router {
    let static_assets = Router::new()
        .fallback_service(
            ServeDir::new(static_dir)
                .precompressed_br()
                .precompressed_gzip(),
        )
        .layer(middleware::from_fn(set_static_cache_control));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    let app = Router::new()
        .route("/api/health", get(routes::api::health))
        .route("/api/metrics", get(routes::api::metrics))
        .route("/api/polygons", get(routes::api::list_polygons))
        .route("/api/polygon/{cell}/info", get(routes::api::get_cell_info))
        .route(
            "/api/polygon/{resolution}/{cell}/info",
            get(routes::api::get_cell_info_at_resolution),
        );

    app.layer(CompressionLayer::new())
        .layer(cors)
        .fallback_service(static_assets)
        .with_state(state)
}

async fn set_static_cache_control(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    if response.status().is_success()
        && let Some(cache_control) = cache_control_for_path(&path)
    {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(cache_control),
        );
    }

    response
}

const IMMUTABLE_ASSET_CACHE: &str = "public, max-age=31536000, immutable";
const ENTRY_PAGE_CACHE: &str = "no-cache";

fn cache_control_for_path(path: &str) -> Option<&'static str> {
    let asset = Path::new(path);
    match asset.extension().and_then(|ext| ext.to_str()) {
        Some("wasm" | "js" | "css") if has_content_hash(asset) => Some(IMMUTABLE_ASSET_CACHE),
        Some("html") => Some(ENTRY_PAGE_CACHE),
        None if path.ends_with('/') => Some(ENTRY_PAGE_CACHE),
        _ => None,
    }
}

/// Trunk names bundle outputs `<crate>-<hash>[_bg].<ext>`.
fn has_content_hash(asset: &Path) -> bool {
    asset
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| {
            stem.split(['-', '_'])
                .any(|part| part.len() >= 8 && part.bytes().all(|b| b.is_ascii_hexdigit()))
        })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn hashed_bundle_outputs_are_immutable() {
        assert_eq!(
            cache_control_for_path("/hexmap-client-71578f6b278221f3_bg.wasm"),
            Some(IMMUTABLE_ASSET_CACHE)
        );
        assert_eq!(
            cache_control_for_path("/hexmap-client-71578f6b278221f3.js"),
            Some(IMMUTABLE_ASSET_CACHE)
        );
    }

    #[test]
    fn entry_page_is_revalidated() {
        assert_eq!(cache_control_for_path("/"), Some(ENTRY_PAGE_CACHE));
        assert_eq!(cache_control_for_path("/index.html"), Some(ENTRY_PAGE_CACHE));
    }

    #[test]
    fn unhashed_assets_keep_server_defaults() {
        assert_eq!(cache_control_for_path("/hexmap-client.js"), None);
        assert_eq!(cache_control_for_path("/favicon.png"), None);
    }

    #[tokio::test]
    async fn unknown_api_path_falls_through_to_static_dir() {
        let app = build_app_with_static(
            AppState::with_cache_limits(600, 10),
            Path::new("/nonexistent/hexmap-static"),
        );
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/nope")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn info_route_allows_cross_origin_reads() {
        let app = build_app_with_static(
            AppState::with_cache_limits(600, 10),
            Path::new("/nonexistent/hexmap-static"),
        );
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/polygon/7/871f05a0affffff/info")
                    .header(header::ORIGIN, "http://localhost:8080")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|value| value.to_str().ok()),
            Some("*")
        );
    }
}
