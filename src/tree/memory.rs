//! In-memory tree store implementation.
//!
//! This implementation is NOT durable - data is lost on process exit.
//! Use for testing and development only.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{ancestors, assemble, child_path, flatten, validate_path, TreeStore};
use crate::error::Result;

/// In-memory implementation of TreeStore.
///
/// Uses a BTreeMap of leaf paths for ordered sub-tree scans and RwLock for
/// concurrency.
pub struct MemoryTree {
    data: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl MemoryTree {
    /// Create a new empty in-memory tree.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Get the number of stored leaves.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Check if the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Clear all nodes.
    pub fn clear(&self) {
        self.data.write().clear();
    }

    fn remove_subtree(data: &mut BTreeMap<String, Value>, path: &str) {
        data.remove(path);
        let prefix = format!("{}/", path);
        let below: Vec<String> = data
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in below {
            data.remove(&key);
        }
    }

    fn write(data: &mut BTreeMap<String, Value>, path: &str, leaves: Vec<(String, Value)>) {
        Self::remove_subtree(data, path);
        // A scalar stored at an ancestor would shadow the new node.
        for ancestor in ancestors(path) {
            data.remove(ancestor);
        }
        data.extend(leaves);
    }
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TreeStore for MemoryTree {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        validate_path(path)?;

        let data = self.data.read();
        let prefix = format!("{}/", path);
        let exact = data.get(path).map(|value| (path.to_string(), value.clone()));
        let below = data
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(key, value)| (key.clone(), value.clone()));

        Ok(assemble(path, exact.into_iter().chain(below)))
    }

    async fn set(&self, path: &str, value: Value) -> Result<()> {
        validate_path(path)?;
        let leaves = flatten(path, value)?;

        Self::write(&mut self.data.write(), path, leaves);
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<()> {
        validate_path(path)?;

        // Flatten everything before taking the lock so a bad key writes nothing.
        let mut writes = Vec::with_capacity(fields.len());
        for (key, value) in fields {
            let child = child_path(path, &key);
            validate_path(&child)?;
            let leaves = flatten(&child, value)?;
            writes.push((child, leaves));
        }

        let mut data = self.data.write();
        for (child, leaves) in writes {
            Self::write(&mut data, &child, leaves);
        }
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        validate_path(path)?;
        Self::remove_subtree(&mut self.data.write(), path);
        Ok(())
    }
}
