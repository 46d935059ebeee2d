//! Deck API: `/api/decks` and the contents nested below each deck.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use super::{required, ApiError, DescriptionBody, MessageResponse, TitleBody};
use crate::store::{Deck, DeckContent, DeckStore, DeckSummary, DeckWithContents};

type Store = State<Arc<dyn DeckStore>>;

const DESCRIPTION_REQUIRED: &str = "Description is required";

/// Routes of the hierarchical variant.
pub fn routes(store: Arc<dyn DeckStore>) -> Router {
    Router::new()
        .route("/api/decks", get(list_decks).post(create_deck))
        .route("/api/decks/:deck_id", get(get_deck).delete(delete_deck))
        .route("/api/decks/:deck_id/contents", post(add_content))
        .route(
            "/api/decks/:deck_id/contents/:content_id",
            put(update_content).delete(delete_content),
        )
        .with_state(store)
}

async fn list_decks(State(store): Store) -> Result<Json<Vec<DeckSummary>>, ApiError> {
    Ok(Json(store.list_decks().await?))
}

async fn create_deck(
    State(store): Store,
    body: Result<Json<TitleBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Deck>), ApiError> {
    let title = required(body, |b| b.title, "Title is required")?;

    let deck = store.create_deck(&title).await?;
    Ok((StatusCode::CREATED, Json(deck)))
}

async fn get_deck(
    State(store): Store,
    Path(deck_id): Path<String>,
) -> Result<Json<DeckWithContents>, ApiError> {
    store
        .get_deck(&deck_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Deck not found".to_string()))
}

/// Succeeds whether or not the deck existed.
async fn delete_deck(
    State(store): Store,
    Path(deck_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    store.delete_deck(&deck_id).await?;
    Ok(MessageResponse::new("Deck deleted"))
}

async fn add_content(
    State(store): Store,
    Path(deck_id): Path<String>,
    body: Result<Json<DescriptionBody>, JsonRejection>,
) -> Result<(StatusCode, Json<DeckContent>), ApiError> {
    let description = required(body, |b| b.description, DESCRIPTION_REQUIRED)?;

    let content = store.add_content(&deck_id, &description).await?;
    Ok((StatusCode::CREATED, Json(content)))
}

async fn update_content(
    State(store): Store,
    Path((deck_id, content_id)): Path<(String, String)>,
    body: Result<Json<DescriptionBody>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let description = required(body, |b| b.description, DESCRIPTION_REQUIRED)?;

    store
        .update_content(&deck_id, &content_id, &description)
        .await?;
    Ok(MessageResponse::new("Content updated"))
}

async fn delete_content(
    State(store): Store,
    Path((deck_id, content_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    store.delete_content(&deck_id, &content_id).await?;
    Ok(MessageResponse::new("Content deleted"))
}
