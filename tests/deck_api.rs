use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use content_decks::{
    Api, MemoryTree, RestTree, RestTreeConfig, Server, ServerConfig, TreeDeckStore,
};

fn app() -> Router {
    let store = TreeDeckStore::new(MemoryTree::new());
    content_decks::api::decks::routes(Arc::new(store))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send_bytes(app, method, uri, body).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn send_bytes(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn create_deck(app: &Router, title: &str) -> String {
    let (status, deck) = send(app, "POST", "/api/decks", Some(json!({ "title": title }))).await;
    assert_eq!(status, StatusCode::CREATED);
    deck["id"].as_str().unwrap().to_string()
}

async fn add_content(app: &Router, deck_id: &str, description: &str) -> String {
    let (status, content) = send(
        app,
        "POST",
        &format!("/api/decks/{deck_id}/contents"),
        Some(json!({ "description": description })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    content["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn deck_round_trip() {
    let app = app();

    let (status, deck) = send(&app, "POST", "/api/decks", Some(json!({"title": "Spanish"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(deck["title"], "Spanish");
    assert!(deck["createdAt"].is_string());
    assert!(deck.get("contents").is_none());
    let deck_id = deck["id"].as_str().unwrap();

    let (status, content) = send(
        &app,
        "POST",
        &format!("/api/decks/{deck_id}/contents"),
        Some(json!({"description": "hola"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(content["description"], "hola");
    assert!(content["createdAt"].is_string());

    let (status, loaded) = send(&app, "GET", &format!("/api/decks/{deck_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loaded["id"], deck["id"]);
    assert_eq!(loaded["title"], "Spanish");
    assert_eq!(loaded["createdAt"], deck["createdAt"]);
    assert_eq!(loaded["contents"], json!([content]));
}

#[tokio::test]
async fn content_count_matches_contents() {
    let app = app();
    let spanish = create_deck(&app, "Spanish").await;
    create_deck(&app, "Empty").await;

    for word in ["hola", "adios", "gracias"] {
        add_content(&app, &spanish, word).await;
    }

    let (status, decks) = send(&app, "GET", "/api/decks", None).await;
    assert_eq!(status, StatusCode::OK);
    let decks = decks.as_array().unwrap();
    assert_eq!(decks.len(), 2);

    for deck in decks {
        assert!(deck.get("contents").is_none());
        let expected = if deck["id"] == spanish.as_str() { 3 } else { 0 };
        assert_eq!(deck["contentCount"], expected);
    }
}

#[tokio::test]
async fn title_and_description_are_required() {
    let app = app();

    for body in [json!({}), json!({"title": ""}), json!({"title": 1})] {
        let (status, error) = send(&app, "POST", "/api/decks", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error, json!({"error": "Title is required"}));
    }
    let (_, decks) = send(&app, "GET", "/api/decks", None).await;
    assert_eq!(decks, json!([]));

    let deck_id = create_deck(&app, "Spanish").await;
    let (status, error) = send(
        &app,
        "POST",
        &format!("/api/decks/{deck_id}/contents"),
        Some(json!({"description": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error, json!({"error": "Description is required"}));
}

#[tokio::test]
async fn missing_deck_is_404() {
    let app = app();

    let (status, error) = send(&app, "GET", "/api/decks/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error, json!({"error": "Deck not found"}));

    let (status, error) = send(
        &app,
        "POST",
        "/api/decks/nope/contents",
        Some(json!({"description": "orphan"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error, json!({"error": "Deck not found"}));

    let (_, decks) = send(&app, "GET", "/api/decks", None).await;
    assert_eq!(decks, json!([]));
}

#[tokio::test]
async fn delete_deck_is_idempotent() {
    let app = app();
    let deck_id = create_deck(&app, "Spanish").await;
    add_content(&app, &deck_id, "hola").await;

    for _ in 0..2 {
        let (status, body) = send(&app, "DELETE", &format!("/api/decks/{deck_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Deck deleted"}));
    }

    let (status, _) = send(&app, "GET", &format!("/api/decks/{deck_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_content() {
    let app = app();
    let deck_id = create_deck(&app, "Spanish").await;
    let content_id = add_content(&app, &deck_id, "hola").await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/decks/{deck_id}/contents/{content_id}"),
        Some(json!({"description": "buenos dias"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Content updated"}));

    let (_, deck) = send(&app, "GET", &format!("/api/decks/{deck_id}"), None).await;
    assert_eq!(deck["contents"][0]["id"], content_id.as_str());
    assert_eq!(deck["contents"][0]["description"], "buenos dias");

    let (status, error) = send(
        &app,
        "PUT",
        &format!("/api/decks/{deck_id}/contents/{content_id}"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "Description is required");
}

#[tokio::test]
async fn update_missing_content_creates_nothing() {
    let app = app();
    let deck_id = create_deck(&app, "Spanish").await;

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/decks/{deck_id}/contents/ghost"),
        Some(json!({"description": "boo"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, deck) = send(&app, "GET", &format!("/api/decks/{deck_id}"), None).await;
    assert_eq!(deck["contents"], json!([]));
}

#[tokio::test]
async fn delete_content_decrements_count() {
    let app = app();
    let deck_id = create_deck(&app, "Spanish").await;
    let first = add_content(&app, &deck_id, "hola").await;
    add_content(&app, &deck_id, "adios").await;

    let uri = format!("/api/decks/{deck_id}/contents/{first}");
    for _ in 0..2 {
        let (status, body) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Content deleted"}));
    }

    let (_, decks) = send(&app, "GET", "/api/decks", None).await;
    assert_eq!(decks[0]["contentCount"], 1);
}

#[tokio::test]
async fn invalid_keys_are_rejected() {
    let app = app();

    let (status, _) = send(&app, "GET", "/api/decks/a.b", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/decks/a$b/contents",
        Some(json!({"description": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unreachable_backend_is_generic_500() {
    let tree = RestTree::new(RestTreeConfig::new("http://127.0.0.1:1").with_timeout_secs(5)).unwrap();
    let app = content_decks::api::decks::routes(Arc::new(TreeDeckStore::new(tree)));

    let (status, error) = send(&app, "GET", "/api/decks", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error, json!({"error": "Server error"}));
}

#[tokio::test]
async fn server_serves_pages_and_health() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>decks</h1>").unwrap();
    std::fs::write(dir.path().join("deck.html"), "<h1>one deck</h1>").unwrap();
    std::fs::write(dir.path().join("style.css"), "body {}").unwrap();

    let config = ServerConfig::builder().static_dir(dir.path()).build();
    let store = Arc::new(TreeDeckStore::new(MemoryTree::new()));
    let app = Server::new(config, Api::Decks(store)).router();

    let (status, body) = send_bytes(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"<h1>decks</h1>");

    let (status, body) = send_bytes(&app, "GET", "/deck", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"<h1>one deck</h1>");

    let (status, body) = send_bytes(&app, "GET", "/style.css", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"body {}");

    let (status, body) = send_bytes(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");

    let (status, decks) = send(&app, "GET", "/api/decks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decks, json!([]));
}
