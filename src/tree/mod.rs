//! TreeStore trait - a path-addressed JSON tree.
//!
//! The hierarchical variant keeps decks in a tree shaped like a realtime
//! database document:
//!
//! ```text
//! /decks/{deckId}/title
//! /decks/{deckId}/createdAt
//! /decks/{deckId}/contents/{contentId}/description
//! /decks/{deckId}/contents/{contentId}/createdAt
//! ```
//!
//! Semantics shared by every backend:
//! - writing below a missing node creates the intermediate nodes
//! - writing `null` or an empty object removes the node
//! - removing a node removes its whole sub-tree
//! - reading a node returns its sub-tree assembled into one JSON value
//!
//! Backends that store flat rows ([`MemoryTree`], [`SqliteTree`]) keep one
//! row per leaf, keyed by the leaf's full path. [`flatten`] and [`assemble`]
//! convert between the two shapes.

mod memory;
mod push_id;
mod rest;
mod sqlite;

pub use memory::MemoryTree;
pub use push_id::PushIdGenerator;
pub use rest::{RestTree, RestTreeConfig};
pub use sqlite::SqliteTree;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, StoreError};
use crate::store::validate_key;

/// Maximum number of keys in a path.
pub const MAX_DEPTH: usize = 32;

/// Validate a `/`-separated path and return its keys.
pub fn validate_path(path: &str) -> Result<Vec<&str>> {
    let rest = path
        .strip_prefix('/')
        .ok_or_else(|| StoreError::InvalidKey(format!("path {:?} must start with '/'", path)))?;

    let keys: Vec<&str> = rest.split('/').collect();
    if keys.len() > MAX_DEPTH {
        return Err(StoreError::InvalidKey(format!(
            "path {:?} is deeper than {} keys",
            path, MAX_DEPTH
        )));
    }
    for key in &keys {
        validate_key(key)?;
    }
    Ok(keys)
}

/// Join a validated path and a child key.
pub fn child_path(path: &str, key: &str) -> String {
    format!("{}/{}", path, key)
}

/// Every proper ancestor of a path, shortest first (`/a/b/c` → `/a`, `/a/b`).
pub(crate) fn ancestors(path: &str) -> Vec<&str> {
    path.match_indices('/')
        .skip(1)
        .map(|(idx, _)| &path[..idx])
        .collect()
}

/// Split a value into `(path, leaf)` rows.
///
/// Objects are descended into, `null` produces nothing, every other value is
/// a leaf. Object keys are validated along the way.
pub fn flatten(path: &str, value: Value) -> Result<Vec<(String, Value)>> {
    let mut leaves = Vec::new();
    flatten_into(path.to_string(), value, &mut leaves)?;
    Ok(leaves)
}

fn flatten_into(path: String, value: Value, out: &mut Vec<(String, Value)>) -> Result<()> {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, child) in map {
                validate_key(&key)?;
                flatten_into(child_path(&path, &key), child, out)?;
            }
        }
        leaf => out.push((path, leaf)),
    }
    Ok(())
}

/// Rebuild the value at `path` from the leaf rows at or below it.
///
/// Returns `None` when there are no rows.
pub fn assemble<I>(path: &str, leaves: I) -> Option<Value>
where
    I: IntoIterator<Item = (String, Value)>,
{
    let prefix = format!("{}/", path);
    let mut root = Map::new();
    let mut found = false;

    for (key, value) in leaves {
        if key == path {
            return Some(value);
        }
        let Some(relative) = key.strip_prefix(&prefix) else {
            continue;
        };
        found = true;

        let mut node = &mut root;
        let mut segments = relative.split('/').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                node.insert(segment.to_string(), value);
                break;
            }
            let entry = node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            node = match entry {
                Value::Object(map) => map,
                _ => unreachable!("entry was just made an object"),
            };
        }
    }

    found.then_some(Value::Object(root))
}

/// The core tree storage trait.
///
/// All tree backends (memory, SQLite, REST) implement this trait.
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Read the sub-tree at `path`.
    ///
    /// Returns `None` if nothing is stored at or below the path.
    async fn get(&self, path: &str) -> Result<Option<Value>>;

    /// Read the sub-tree at `path` and deserialize it.
    async fn get_json<T: DeserializeOwned + Send>(&self, path: &str) -> Result<Option<T>> {
        match self.get(path).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Replace the sub-tree at `path` with `value`.
    async fn set(&self, path: &str, value: Value) -> Result<()>;

    /// Replace the sub-tree at `path` with a serialized value.
    async fn set_json<T: Serialize + Send + Sync>(&self, path: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(path, value).await
    }

    /// Replace only the named children of `path`, leaving siblings alone.
    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<()>;

    /// Remove the sub-tree at `path`.
    ///
    /// Returns `Ok(())` if the node was removed or didn't exist.
    async fn remove(&self, path: &str) -> Result<()>;

    /// Check if anything is stored at or below `path`.
    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.get(path).await?.is_some())
    }
}
