//! Deck store over any [`TreeStore`].
//!
//! Decks live under `/decks/{deckId}` and own their contents at
//! `/decks/{deckId}/contents/{contentId}`. Keys come from a
//! [`PushIdGenerator`], so key order is creation order. The deck listing's
//! `contentCount` is counted from the contents map on every read.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::store::{
    iso_timestamp, validate_key, Deck, DeckContent, DeckStore, DeckSummary, DeckWithContents,
};
use crate::tree::{PushIdGenerator, TreeStore};

/// Tree path under which every deck is stored.
pub const DECKS_ROOT: &str = "/decks";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeckNode {
    #[serde(default)]
    title: String,
    #[serde(default)]
    created_at: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    contents: BTreeMap<String, ContentNode>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentNode {
    #[serde(default)]
    description: String,
    #[serde(default)]
    created_at: String,
}

impl DeckNode {
    fn into_deck(self, id: String) -> (Deck, BTreeMap<String, ContentNode>) {
        let deck = Deck {
            id,
            title: self.title,
            created_at: self.created_at,
        };
        (deck, self.contents)
    }
}

impl ContentNode {
    fn into_content(self, id: String) -> DeckContent {
        DeckContent {
            id,
            description: self.description,
            created_at: self.created_at,
        }
    }
}

/// [`DeckStore`] implementation backed by a [`TreeStore`].
pub struct TreeDeckStore<T> {
    tree: T,
    ids: PushIdGenerator,
}

impl<T: TreeStore> TreeDeckStore<T> {
    pub fn new(tree: T) -> Self {
        Self {
            tree,
            ids: PushIdGenerator::new(),
        }
    }

    /// The underlying tree.
    pub fn tree(&self) -> &T {
        &self.tree
    }

    fn deck_path(deck_id: &str) -> Result<String> {
        validate_key(deck_id)?;
        Ok(format!("{}/{}", DECKS_ROOT, deck_id))
    }

    /// Every deck written by [`DeckStore::create_deck`] has a title leaf.
    fn title_path(deck_id: &str) -> Result<String> {
        Ok(format!("{}/title", Self::deck_path(deck_id)?))
    }

    fn content_path(deck_id: &str, content_id: &str) -> Result<String> {
        validate_key(content_id)?;
        Ok(format!("{}/contents/{}", Self::deck_path(deck_id)?, content_id))
    }
}

#[async_trait]
impl<T: TreeStore> DeckStore for TreeDeckStore<T> {
    async fn create_deck(&self, title: &str) -> Result<Deck> {
        let id = self.ids.next_id();
        let node = DeckNode {
            title: title.to_string(),
            created_at: iso_timestamp(),
            contents: BTreeMap::new(),
        };

        self.tree.set_json(&Self::deck_path(&id)?, &node).await?;
        debug!(deck_id = %id, "Deck created");

        Ok(node.into_deck(id).0)
    }

    async fn list_decks(&self) -> Result<Vec<DeckSummary>> {
        let decks: BTreeMap<String, DeckNode> =
            self.tree.get_json(DECKS_ROOT).await?.unwrap_or_default();

        Ok(decks
            .into_iter()
            .map(|(id, node)| {
                let (deck, contents) = node.into_deck(id);
                DeckSummary {
                    id: deck.id,
                    title: deck.title,
                    created_at: deck.created_at,
                    content_count: contents.len(),
                }
            })
            .collect())
    }

    async fn get_deck(&self, id: &str) -> Result<Option<DeckWithContents>> {
        let node: Option<DeckNode> = self.tree.get_json(&Self::deck_path(id)?).await?;

        Ok(node.map(|node| {
            let (deck, contents) = node.into_deck(id.to_string());
            DeckWithContents {
                deck,
                contents: contents
                    .into_iter()
                    .map(|(content_id, content)| content.into_content(content_id))
                    .collect(),
            }
        }))
    }

    async fn delete_deck(&self, id: &str) -> Result<()> {
        self.tree.remove(&Self::deck_path(id)?).await
    }

    async fn add_content(&self, deck_id: &str, description: &str) -> Result<DeckContent> {
        // Writing below a missing deck would silently create it.
        let title_path = Self::title_path(deck_id)?;
        if !self.tree.exists(&title_path).await? {
            return Err(StoreError::deck_not_found(deck_id));
        }

        let id = self.ids.next_id();
        let path = Self::content_path(deck_id, &id)?;
        let node = ContentNode {
            description: description.to_string(),
            created_at: iso_timestamp(),
        };
        self.tree.set_json(&path, &node).await?;

        // The deck may have been deleted between the check and the write.
        if !self.tree.exists(&title_path).await? {
            debug!(deck_id, content_id = %id, "Deck removed during add, dropping content");
            self.tree.remove(&path).await?;
            return Err(StoreError::deck_not_found(deck_id));
        }
        debug!(deck_id, content_id = %id, "Content added");

        Ok(node.into_content(id))
    }

    async fn update_content(
        &self,
        deck_id: &str,
        content_id: &str,
        description: &str,
    ) -> Result<()> {
        let path = Self::content_path(deck_id, content_id)?;
        if !self.tree.exists(&path).await? {
            debug!(deck_id, content_id, "Update of missing content ignored");
            return Ok(());
        }

        let mut fields = Map::new();
        fields.insert(
            "description".to_string(),
            Value::String(description.to_string()),
        );
        self.tree.update(&path, fields).await
    }

    async fn delete_content(&self, deck_id: &str, content_id: &str) -> Result<()> {
        self.tree
            .remove(&Self::content_path(deck_id, content_id)?)
            .await
    }
}
