//! Favorites flows used by the dashboard and "my list" pages.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use animelist::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::ops::Deref;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

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

async fn spawn_app() -> (Arc<animelist::api::AppState>, TestApp, String) {
    let dir = TempDir::new().unwrap();

    let mut config = Config::default();
    config.general.database_path =
        format!("sqlite:{}", dir.path().join("favorites.db").display());

    let state = animelist::api::create_app_state_from_config(config, None)
        .await
        .expect("failed to create app state");

    let api_key = state
        .store()
        .get_user_api_key("admin")
        .await
        .expect("failed to fetch api key")
        .expect("missing bootstrap api key");

    let router = animelist::api::router(state.clone()).await;
    (state, TestApp { router, _dir: dir }, api_key)
}

async fn send(app: &Router, method: &str, uri: &str, api_key: &str, body: Option<Value>) -> Response {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Api-Key", api_key);

    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn bebop() -> Value {
    json!({
        "malId": 1,
        "title": "Cowboy Bebop",
        "image": "https://cdn.myanimelist.net/images/anime/4/19644.jpg",
        "url": "https://myanimelist.net/anime/1/Cowboy_Bebop",
        "synopsis": "Crime is timeless.",
        "score": 8.75
    })
}

async fn add(app: &Router, api_key: &str, body: Value) -> Value {
    let response = send(app, "POST", "/api/animes", api_key, Some(body)).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

async fn register(app: &Router, username: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    json!({"username": username, "password": "a-long-password"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["api_key"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn add_defaults_to_to_watch() {
    let (_state, app, key) = spawn_app().await;

    let favorite = add(&app, &key, bebop()).await;

    assert!(favorite["id"].as_i64().unwrap() > 0);
    assert_eq!(favorite["mal_id"], 1);
    assert_eq!(favorite["title"], "Cowboy Bebop");
    assert_eq!(favorite["status"], "to_watch");
    assert_eq!(favorite["score"], 8.75);
    assert!(favorite["user_rating"].is_null());
}

#[tokio::test]
async fn re_adding_updates_in_place() {
    let (_state, app, key) = spawn_app().await;

    let first = add(&app, &key, bebop()).await;
    let id = first["id"].as_i64().unwrap();

    let response = send(
        &app,
        "PATCH",
        &format!("/api/animes/{id}"),
        &key,
        Some(json!({"user_rating": 9, "status": "completed"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut updated = bebop();
    updated["title"] = json!("Cowboy Bebop (Remastered)");
    updated["status"] = json!("en cours");
    let second = add(&app, &key, updated).await;

    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["created_at"], first["created_at"]);
    assert_eq!(second["title"], "Cowboy Bebop (Remastered)");
    assert_eq!(second["status"], "watching");
    assert_eq!(second["user_rating"], 9);

    let response = send(&app, "GET", "/api/animes", &key, None).await;
    let list = body_json(response).await["data"].clone();
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn re_adding_without_status_resets_to_to_watch() {
    let (_state, app, key) = spawn_app().await;

    let first = add(&app, &key, bebop()).await;
    let id = first["id"].as_i64().unwrap();

    let response = send(
        &app,
        "PATCH",
        &format!("/api/animes/{id}/status"),
        &key,
        Some(json!({"status": "completed"})),
    )
    .await;
    assert_eq!(body_json(response).await["data"]["status"], "completed");

    let second = add(&app, &key, bebop()).await;

    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["status"], "to_watch");
}

#[tokio::test]
async fn list_is_newest_first_and_filterable() {
    let (_state, app, key) = spawn_app().await;

    add(&app, &key, json!({"malId": 1, "title": "Cowboy Bebop"})).await;
    add(
        &app,
        &key,
        json!({"malId": 5, "title": "Cowboy Bebop: The Movie", "status": "watching"}),
    )
    .await;
    add(
        &app,
        &key,
        json!({"mal_id": 19, "title": "Monster", "status": "terminé"}),
    )
    .await;

    let response = send(&app, "GET", "/api/animes", &key, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let list = body_json(response).await["data"].clone();
    let mal_ids: Vec<i64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["mal_id"].as_i64().unwrap())
        .collect();
    assert_eq!(mal_ids, vec![19, 5, 1]);

    let response = send(&app, "GET", "/api/animes?status=watching", &key, None).await;
    let list = body_json(response).await["data"].clone();
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["mal_id"], 5);

    let response = send(&app, "GET", "/api/animes?status=dropped", &key, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_and_statuses() {
    let (_state, app, key) = spawn_app().await;

    add(&app, &key, json!({"malId": 1, "title": "Cowboy Bebop"})).await;
    add(&app, &key, json!({"malId": 30, "title": "Evangelion"})).await;
    add(
        &app,
        &key,
        json!({"malId": 19, "title": "Monster", "status": "completed"}),
    )
    .await;

    let response = send(&app, "GET", "/api/animes/stats", &key, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let stats = body_json(response).await["data"].clone();
    assert_eq!(stats, json!({"to_watch": 2, "watching": 0, "completed": 1, "total": 3}));

    let response = send(&app, "GET", "/api/animes/statuses", &key, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let statuses = body_json(response).await["data"].clone();
    assert_eq!(
        statuses,
        json!({"1": "to_watch", "19": "completed", "30": "to_watch"})
    );
}

#[tokio::test]
async fn status_and_rating_updates() {
    let (_state, app, key) = spawn_app().await;
    let favorite = add(&app, &key, bebop()).await;
    let id = favorite["id"].as_i64().unwrap();

    let response = send(
        &app,
        "PATCH",
        &format!("/api/animes/{id}/status"),
        &key,
        Some(json!({"status": "watching"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "watching");

    let response = send(
        &app,
        "PATCH",
        &format!("/api/animes/{id}/status"),
        &key,
        Some(json!({"status": "paused"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "PATCH",
        &format!("/api/animes/{id}"),
        &key,
        Some(json!({"userRating": 8})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await["data"].clone();
    assert_eq!(updated["user_rating"], 8);
    assert_eq!(updated["status"], "watching");

    let response = send(
        &app,
        "PATCH",
        &format!("/api/animes/{id}"),
        &key,
        Some(json!({"user_rating": 11})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "PATCH",
        &format!("/api/animes/{id}"),
        &key,
        Some(json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "PATCH",
        &format!("/api/animes/{id}"),
        &key,
        Some(json!({"user_rating": null})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"]["user_rating"].is_null());

    let response = send(
        &app,
        "PATCH",
        "/api/animes/9999/status",
        &key,
        Some(json!({"status": "completed"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_and_remove() {
    let (_state, app, key) = spawn_app().await;
    let favorite = add(&app, &key, bebop()).await;
    let id = favorite["id"].as_i64().unwrap();

    let response = send(&app, "GET", &format!("/api/animes/{id}"), &key, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["title"], "Cowboy Bebop");

    let response = send(&app, "DELETE", &format!("/api/animes/{id}"), &key, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", &format!("/api/animes/{id}"), &key, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "DELETE", &format!("/api/animes/{id}"), &key, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "GET", "/api/animes/abc", &key, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "DELETE", "/api/animes/0", &key, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn users_cannot_see_each_others_lists() {
    let (_state, app, admin_key) = spawn_app().await;
    let other_key = register(&app, "vicious").await;

    let favorite = add(&app, &admin_key, bebop()).await;
    let id = favorite["id"].as_i64().unwrap();

    let response = send(&app, "GET", &format!("/api/animes/{id}"), &other_key, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        "DELETE",
        &format!("/api/animes/{id}"),
        &other_key,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "GET", "/api/animes", &other_key, None).await;
    assert!(body_json(response).await["data"]
        .as_array()
        .unwrap()
        .is_empty());

    // Same catalog title is a separate row for another user
    let theirs = add(&app, &other_key, bebop()).await;
    assert_ne!(theirs["id"], favorite["id"]);

    let response = send(&app, "GET", &format!("/api/animes/{id}"), &admin_key, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn add_validates_payload() {
    let (_state, app, key) = spawn_app().await;

    let cases = [
        json!({"title": "No id"}),
        json!({"malId": 0, "title": "Zero"}),
        json!({"malId": 1, "title": "   "}),
        json!({"malId": 1, "title": "Bad url", "url": "not-a-url"}),
        json!({"malId": 1, "title": "Bad score", "score": 42.0}),
        json!({"malId": 1, "title": "Bad status", "status": "dropped"}),
        json!({"malId": "one", "title": "Wrong type"}),
    ];

    for body in cases {
        let response = send(&app, "POST", "/api/animes", &key, Some(body.clone())).await;
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "expected 400 for {body}"
        );
        assert_eq!(body_json(response).await["success"], false);
    }

    let response = send(&app, "GET", "/api/animes", &key, None).await;
    assert!(body_json(response).await["data"]
        .as_array()
        .unwrap()
        .is_empty());
}
