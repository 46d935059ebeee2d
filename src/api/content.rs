//! Flat content API: `/api/content`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use super::{required, ApiError, DescriptionBody, MessageResponse};
use crate::store::{Content, ContentStore};

type Store = State<Arc<dyn ContentStore>>;

const DESCRIPTION_REQUIRED: &str = "Description is required";
const NOT_FOUND: &str = "Content not found";

/// Routes of the flat variant.
pub fn routes(store: Arc<dyn ContentStore>) -> Router {
    Router::new()
        .route("/api/content", get(list_content).post(create_content))
        .route(
            "/api/content/:id",
            get(get_content).put(update_content).delete(delete_content),
        )
        .with_state(store)
}

/// A non-numeric id can never match a row.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(NOT_FOUND.to_string()))
}

async fn list_content(State(store): Store) -> Result<Json<Vec<Content>>, ApiError> {
    Ok(Json(store.list_all().await?))
}

async fn create_content(
    State(store): Store,
    body: Result<Json<DescriptionBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Content>), ApiError> {
    let description = required(body, |b| b.description, DESCRIPTION_REQUIRED)?;

    let content = store.insert(&description).await?;
    tracing::debug!(id = content.id, "Content created");
    Ok((StatusCode::CREATED, Json(content)))
}

async fn get_content(State(store): Store, Path(id): Path<String>) -> Result<Json<Content>, ApiError> {
    let id = parse_id(&id)?;
    store
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))
}

async fn update_content(
    State(store): Store,
    Path(id): Path<String>,
    body: Result<Json<DescriptionBody>, JsonRejection>,
) -> Result<Json<Content>, ApiError> {
    let description = required(body, |b| b.description, DESCRIPTION_REQUIRED)?;
    let id = parse_id(&id)?;

    store
        .update(id, &description)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))
}

async fn delete_content(
    State(store): Store,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;

    match store.delete(id).await? {
        Some(deleted) => {
            tracing::debug!(id = deleted.id, "Content deleted");
            Ok(MessageResponse::new("Content deleted"))
        }
        None => Err(ApiError::NotFound(NOT_FOUND.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(matches!(parse_id("abc"), Err(ApiError::NotFound(_))));
        assert!(matches!(parse_id(""), Err(ApiError::NotFound(_))));
    }
}
