//! HTTP handlers for both API variants.
//!
//! Every handler follows the same protocol: extract path parameters and
//! body, check required fields before touching the store, call one store
//! operation, map the outcome to a status code and JSON body.

pub mod content;
pub mod decks;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::StoreError;

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Body of confirmation responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Errors a handler can answer with.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field is missing or the body is unreadable (400).
    #[error("{0}")]
    Validation(String),

    /// The referenced record does not exist (404).
    #[error("{0}")]
    NotFound(String),

    /// Anything else the store reported (500, detail logged only).
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, .. } => ApiError::NotFound(format!("{} not found", kind)),
            StoreError::InvalidKey(message) => ApiError::Validation(message),
            other => ApiError::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Store(err) => {
                tracing::error!(error = %err, "Store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Request body carrying a description.
#[derive(Debug, Deserialize)]
pub struct DescriptionBody {
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body carrying a title.
#[derive(Debug, Deserialize)]
pub struct TitleBody {
    #[serde(default)]
    pub title: Option<String>,
}

/// Pull a non-empty field out of a JSON body.
///
/// A body that fails to parse counts as a missing field.
pub(crate) fn required<T>(
    body: Result<Json<T>, JsonRejection>,
    field: impl FnOnce(T) -> Option<String>,
    message: &str,
) -> Result<String, ApiError> {
    let value = match body {
        Ok(Json(body)) => field(body),
        Err(rejection) => {
            tracing::debug!(%rejection, "Unreadable request body");
            None
        }
    };

    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ApiError::Validation(message.to_string())),
    }
}

/// Liveness probe.
pub async fn health() -> &'static str {
    "OK"
}
