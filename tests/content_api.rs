use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use content_decks::api::content::routes;
use content_decks::{Content, ContentStore, SqliteContentStore, StoreError};

async fn app() -> Router {
    let store = SqliteContentStore::in_memory().await.unwrap();
    routes(Arc::new(store))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_raw(app, method, uri, body.map(|b| b.to_string())).await
}

async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body)),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn create_then_list() {
    let app = app().await;

    let (status, created) = send(
        &app,
        "POST",
        "/api/content",
        Some(json!({"description": "buy milk"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 1);
    assert_eq!(created["description"], "buy milk");
    assert!(created["created_at"].is_string());

    let (status, listed) = send(&app, "GET", "/api/content", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([created]));
}

#[tokio::test]
async fn new_rows_get_larger_ids() {
    let app = app().await;
    let mut max_id = 0;

    for description in ["one", "two", "three"] {
        let (_, created) = send(
            &app,
            "POST",
            "/api/content",
            Some(json!({ "description": description })),
        )
        .await;
        let id = created["id"].as_i64().unwrap();
        assert!(id > max_id);
        max_id = id;

        let (_, listed) = send(&app, "GET", "/api/content", None).await;
        let matching: Vec<&Value> = listed
            .as_array()
            .unwrap()
            .iter()
            .filter(|row| row["description"] == description)
            .collect();
        assert_eq!(matching.len(), 1);
    }

    let (_, listed) = send(&app, "GET", "/api/content", None).await;
    let ids: Vec<i64> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn missing_description_is_rejected() {
    let app = app().await;

    for body in [
        Some(json!({}).to_string()),
        Some(json!({"description": ""}).to_string()),
        Some(json!({"description": null}).to_string()),
        Some(json!({"description": 7}).to_string()),
        Some("{not json".to_string()),
        None,
    ] {
        let (status, error) = send_raw(&app, "POST", "/api/content", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error, json!({"error": "Description is required"}));
    }

    let (_, listed) = send(&app, "GET", "/api/content", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn get_by_id() {
    let app = app().await;
    let (_, created) = send(
        &app,
        "POST",
        "/api/content",
        Some(json!({"description": "buy milk"})),
    )
    .await;

    let (status, fetched) = send(&app, "GET", "/api/content/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    for uri in ["/api/content/2", "/api/content/abc"] {
        let (status, error) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error, json!({"error": "Content not found"}));
    }
}

#[tokio::test]
async fn update_existing_row() {
    let app = app().await;
    let (_, created) = send(
        &app,
        "POST",
        "/api/content",
        Some(json!({"description": "draft"})),
    )
    .await;

    let (status, updated) = send(
        &app,
        "PUT",
        "/api/content/1",
        Some(json!({"description": "final"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], 1);
    assert_eq!(updated["description"], "final");
    assert_eq!(updated["created_at"], created["created_at"]);

    let (status, error) = send(&app, "PUT", "/api/content/1", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "Description is required");
}

#[tokio::test]
async fn update_missing_row_is_404_without_mutation() {
    let app = app().await;
    send(
        &app,
        "POST",
        "/api/content",
        Some(json!({"description": "keep"})),
    )
    .await;
    let (_, before) = send(&app, "GET", "/api/content", None).await;

    let (status, error) = send(
        &app,
        "PUT",
        "/api/content/99",
        Some(json!({"description": "ghost"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error, json!({"error": "Content not found"}));

    let (_, after) = send(&app, "GET", "/api/content", None).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn delete_twice_is_200_then_404() {
    let app = app().await;
    send(
        &app,
        "POST",
        "/api/content",
        Some(json!({"description": "temp"})),
    )
    .await;

    let (status, body) = send(&app, "DELETE", "/api/content/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Content deleted"}));

    let (status, body) = send(&app, "DELETE", "/api/content/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Content not found"}));
}

struct DownStore;

#[async_trait]
impl ContentStore for DownStore {
    async fn ensure_schema(&self) -> content_decks::Result<()> {
        Err(down())
    }

    async fn insert(&self, _description: &str) -> content_decks::Result<Content> {
        Err(down())
    }

    async fn list_all(&self) -> content_decks::Result<Vec<Content>> {
        Err(down())
    }

    async fn get(&self, _id: i64) -> content_decks::Result<Option<Content>> {
        Err(down())
    }

    async fn update(&self, _id: i64, _description: &str) -> content_decks::Result<Option<Content>> {
        Err(down())
    }

    async fn delete(&self, _id: i64) -> content_decks::Result<Option<Content>> {
        Err(down())
    }
}

fn down() -> StoreError {
    StoreError::ConnectionError("connection refused by db.internal:5432".to_string())
}

#[tokio::test]
async fn store_failures_are_generic_500() {
    let app = routes(Arc::new(DownStore));

    let requests = [
        ("GET", "/api/content", None),
        ("POST", "/api/content", Some(json!({"description": "x"}))),
        ("PUT", "/api/content/1", Some(json!({"description": "x"}))),
        ("DELETE", "/api/content/1", None),
    ];
    for (method, uri, body) in requests {
        let (status, error) = send(&app, method, uri, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error, json!({"error": "Server error"}));
    }
}

#[tokio::test]
async fn validation_happens_before_the_store() {
    let app = routes(Arc::new(DownStore));

    let (status, _) = send(&app, "POST", "/api/content", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
