//! Catalog gateway against a fake Jikan server on an ephemeral port.

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use animelist::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tower::ServiceExt;

#[derive(Default)]
struct FakeJikan {
    /// Hits on `/anime/3`, which answers 503 until the third call
    flaky_hits: AtomicUsize,
    search_hits: AtomicUsize,
    last_search: std::sync::Mutex<HashMap<String, String>>,
}

async fn fake_search(
    State(fake): State<Arc<FakeJikan>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    fake.search_hits.fetch_add(1, Ordering::SeqCst);
    *fake.last_search.lock().unwrap() = params.clone();

    match params.get("q").map(String::as_str) {
        Some("teapot") => StatusCode::IM_A_TEAPOT.into_response(),
        Some("missing") => StatusCode::NOT_FOUND.into_response(),
        Some("nothing") => Json(json!({
            "data": null,
            "pagination": {"has_next_page": false, "items": {"total": 0}}
        }))
        .into_response(),
        Some("derived") => Json(json!({
            "data": [{"mal_id": 1}],
            "pagination": {"has_next_page": false, "items": {"total": 50}}
        }))
        .into_response(),
        _ => Json(json!({
            "data": [
                {"mal_id": 1, "title": "Cowboy Bebop", "type": "TV"},
                {"mal_id": 5, "title": "Cowboy Bebop: The Movie", "type": "Movie"}
            ],
            "pagination": {
                "last_visible_page": 1178,
                "has_next_page": true,
                "current_page": 1,
                "items": {"count": 2, "total": 28262, "per_page": 25}
            }
        }))
        .into_response(),
    }
}

async fn fake_anime(State(fake): State<Arc<FakeJikan>>, Path(id): Path<i32>) -> Response {
    if id == 3 && fake.flaky_hits.fetch_add(1, Ordering::SeqCst) < 2 {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    Json(json!({"data": {"mal_id": id, "title": format!("Anime {id}")}})).into_response()
}

async fn fake_characters(Path(id): Path<i32>) -> Response {
    Json(json!({"data": [{"character": {"mal_id": id * 100, "name": "Spike Spiegel"}, "role": "Main"}]}))
        .into_response()
}

async fn fake_statistics(Path(id): Path<i32>) -> Response {
    if id == 2 {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(json!({"data": {"watching": 10, "completed": 20}})).into_response()
}

async fn fake_top(Query(params): Query<HashMap<String, String>>) -> Response {
    let limit: i32 = params
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(25);
    let items: Vec<Value> = (1..=limit).map(|i| json!({"mal_id": i, "rank": i})).collect();
    Json(json!({"data": items})).into_response()
}

async fn spawn_fake_jikan() -> (Arc<FakeJikan>, String) {
    let fake = Arc::new(FakeJikan::default());

    let app = Router::new()
        .route("/v4/anime", get(fake_search))
        .route("/v4/anime/{id}", get(fake_anime))
        .route("/v4/anime/{id}/characters", get(fake_characters))
        .route("/v4/anime/{id}/statistics", get(fake_statistics))
        .route("/v4/top/anime", get(fake_top))
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (fake, format!("http://{addr}/v4/"))
}

/// Router plus the directory holding its database, removed on drop.
struct TestApp {
    router: Router,
    _dir: TempDir,
}

impl Deref for TestApp {
    type Target = Router;

    fn deref(&self) -> &Router {
        &self.router
    }
}

async fn spawn_app(catalog_url: &str) -> TestApp {
    let dir = TempDir::new().unwrap();

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", dir.path().join("catalog.db").display());
    config.catalog.base_url = catalog_url.to_string();
    config.catalog.request_timeout_seconds = 5;
    config.catalog.retry.base_delay_ms = 10;
    config.catalog.retry.max_delay_ms = 50;

    let state = animelist::api::create_app_state_from_config(config, None)
        .await
        .expect("failed to create app state");
    TestApp {
        router: animelist::api::router(state).await,
        _dir: dir,
    }
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn search_passes_items_and_pagination_through() {
    let (fake, url) = spawn_fake_jikan().await;
    let app = spawn_app(&url).await;

    let (status, body) = get_json(&app, "/api/catalog?page=2&limit=10&q=cowboy%20bebop").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["data"][0]["title"], "Cowboy Bebop");
    assert_eq!(body["data"]["data"][1]["type"], "Movie");
    assert_eq!(
        body["data"]["pagination"],
        json!({
            "page": 2,
            "limit": 10,
            "total_pages": 1178,
            "total_items": 28262,
            "has_next": true
        })
    );

    let sent = fake.last_search.lock().unwrap().clone();
    assert_eq!(sent.get("page").map(String::as_str), Some("2"));
    assert_eq!(sent.get("limit").map(String::as_str), Some("10"));
    assert_eq!(sent.get("q").map(String::as_str), Some("cowboy bebop"));
}

#[tokio::test]
async fn search_normalises_bad_parameters() {
    let (fake, url) = spawn_fake_jikan().await;
    let app = spawn_app(&url).await;

    let (status, body) = get_json(&app, "/api/catalog?page=abc&limit=500&q=").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["page"], 1);
    assert_eq!(body["data"]["pagination"]["limit"], 25);

    let sent = fake.last_search.lock().unwrap().clone();
    assert_eq!(sent.get("limit").map(String::as_str), Some("25"));
    assert!(!sent.contains_key("q"));

    let (_, body) = get_json(&app, "/api/catalog").await;
    assert_eq!(body["data"]["pagination"]["limit"], 24);
}

#[tokio::test]
async fn search_derives_pages_when_upstream_omits_them() {
    let (_fake, url) = spawn_fake_jikan().await;
    let app = spawn_app(&url).await;

    let (_, body) = get_json(&app, "/api/catalog?q=derived&limit=24").await;
    assert_eq!(body["data"]["pagination"]["total_pages"], 3);
    assert_eq!(body["data"]["pagination"]["has_next"], true);

    let (_, body) = get_json(&app, "/api/catalog?q=nothing").await;
    assert_eq!(body["data"]["data"], json!([]));
    assert_eq!(body["data"]["pagination"]["total_pages"], 1);
    assert_eq!(body["data"]["pagination"]["has_next"], false);
}

#[tokio::test]
async fn search_forwards_upstream_status() {
    let (fake, url) = spawn_fake_jikan().await;
    let app = spawn_app(&url).await;

    let (status, body) = get_json(&app, "/api/catalog?q=teapot").await;

    assert_eq!(status, StatusCode::IM_A_TEAPOT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "catalog API error: 418");

    let before = fake.search_hits.load(Ordering::SeqCst);
    let (status, body) = get_json(&app, "/api/catalog?q=missing").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "catalog API error: 404");
    // Not retryable, so exactly one upstream call
    assert_eq!(fake.search_hits.load(Ordering::SeqCst), before + 1);
}

#[tokio::test]
async fn detail_aggregates_three_parts() {
    let (_fake, url) = spawn_fake_jikan().await;
    let app = spawn_app(&url).await;

    let (status, body) = get_json(&app, "/api/catalog/1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["anime"]["title"], "Anime 1");
    assert_eq!(
        body["data"]["characters"][0]["character"]["name"],
        "Spike Spiegel"
    );
    assert_eq!(body["data"]["statistics"]["completed"], 20);
}

#[tokio::test]
async fn detail_is_unavailable_when_any_part_fails() {
    let (_fake, url) = spawn_fake_jikan().await;
    let app = spawn_app(&url).await;

    let (status, body) = get_json(&app, "/api/catalog/2").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "catalog service unreachable");
}

#[tokio::test]
async fn detail_retries_through_transient_outage() {
    let (fake, url) = spawn_fake_jikan().await;
    let app = spawn_app(&url).await;

    let (status, body) = get_json(&app, "/api/catalog/3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["anime"]["mal_id"], 3);
    assert_eq!(fake.flaky_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn detail_rejects_bad_ids() {
    let (_fake, url) = spawn_fake_jikan().await;
    let app = spawn_app(&url).await;

    let (status, _) = get_json(&app, "/api/catalog/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(&app, "/api/catalog/-4").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn top_defaults_to_six() {
    let (_fake, url) = spawn_fake_jikan().await;
    let app = spawn_app(&url).await;

    let (status, body) = get_json(&app, "/api/catalog/top").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 6);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 6);

    let (_, body) = get_json(&app, "/api/catalog/top?limit=3").await;
    assert_eq!(body["data"]["total"], 3);
}

#[tokio::test]
async fn unreachable_catalog_is_an_internal_error() {
    // Bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let app = spawn_app(&format!("http://{addr}/v4")).await;

    let (status, body) = get_json(&app, "/api/catalog").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);

    let (status, _) = get_json(&app, "/api/catalog/1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
