//! Store traits - the boundary between HTTP handlers and persistence.
//!
//! Two persistence models exist and a deployment picks one:
//! - [`ContentStore`]: a flat relational table of [`Content`] rows
//! - [`DeckStore`]: a two-level tree of decks owning [`DeckContent`] items
//!
//! Handlers depend on these traits only, so a store can be swapped for an
//! in-memory or failing one in tests.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Maximum length of a single tree key in bytes.
pub const MAX_KEY_LENGTH: usize = 768;

/// Characters that may not appear in a tree key.
const FORBIDDEN_KEY_CHARS: &[char] = &['.', '#', '$', '[', ']', '/'];

/// A row of the flat content table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// Store-assigned, strictly increasing id.
    pub id: i64,
    /// User-entered text.
    pub description: String,
    /// Set by the store at insert.
    pub created_at: DateTime<Utc>,
}

/// A deck without its contents, as returned on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: String,
    pub title: String,
    pub created_at: String,
}

/// One entry of the deck listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckSummary {
    pub id: String,
    pub title: String,
    pub created_at: String,
    /// Number of entries in the deck's contents map at read time.
    pub content_count: usize,
}

/// A deck together with every content item it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckWithContents {
    #[serde(flatten)]
    pub deck: Deck,
    pub contents: Vec<DeckContent>,
}

/// A content item owned by a deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckContent {
    /// Key unique within the parent deck.
    pub id: String,
    pub description: String,
    pub created_at: String,
}

/// Current time as an ISO-8601 string with millisecond precision.
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Validate that a single tree key is well-formed.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey("key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(StoreError::InvalidKey(format!(
            "key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    if let Some(c) = key
        .chars()
        .find(|c| FORBIDDEN_KEY_CHARS.contains(c) || c.is_ascii_control())
    {
        return Err(StoreError::InvalidKey(format!(
            "key {:?} contains forbidden character {:?}",
            key, c
        )));
    }
    Ok(())
}

/// Flat-table store of content rows.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Create the backing table if it is missing. Safe to call on every start.
    async fn ensure_schema(&self) -> Result<()>;

    /// Insert a row; the store assigns `id` and `created_at`.
    async fn insert(&self, description: &str) -> Result<Content>;

    /// Every row in ascending id order.
    async fn list_all(&self) -> Result<Vec<Content>>;

    /// Get a row by id.
    ///
    /// Returns `None` if the row does not exist.
    async fn get(&self, id: i64) -> Result<Option<Content>>;

    /// Replace the description of a row and return the updated row.
    ///
    /// Returns `None` (and writes nothing) if no row matches.
    async fn update(&self, id: i64, description: &str) -> Result<Option<Content>>;

    /// Delete a row and return it.
    ///
    /// Returns `None` if no row matches.
    async fn delete(&self, id: i64) -> Result<Option<Content>>;
}

/// Hierarchical store of decks and the contents they own.
#[async_trait]
pub trait DeckStore: Send + Sync {
    /// Create an empty deck under a fresh key.
    async fn create_deck(&self, title: &str) -> Result<Deck>;

    /// Summaries of every deck, ordered by key.
    async fn list_decks(&self) -> Result<Vec<DeckSummary>>;

    /// Get a deck with its contents.
    ///
    /// Returns `None` if the deck does not exist.
    async fn get_deck(&self, id: &str) -> Result<Option<DeckWithContents>>;

    /// Delete a deck and everything below it.
    ///
    /// Returns `Ok(())` if the deck was deleted or didn't exist.
    async fn delete_deck(&self, id: &str) -> Result<()>;

    /// Add a content item to an existing deck.
    ///
    /// Fails with [`StoreError::NotFound`] if the deck does not exist, including
    /// when the deck is deleted while the item is being written; the item is
    /// then removed again.
    async fn add_content(&self, deck_id: &str, description: &str) -> Result<DeckContent>;

    /// Replace the description of a content item.
    ///
    /// Returns `Ok(())` without writing if the item does not exist.
    async fn update_content(&self, deck_id: &str, content_id: &str, description: &str)
        -> Result<()>;

    /// Delete a content item.
    ///
    /// Returns `Ok(())` if the item was deleted or didn't exist.
    async fn delete_content(&self, deck_id: &str, content_id: &str) -> Result<()>;
}
