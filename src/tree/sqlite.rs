//! SQLite tree store implementation.
//!
//! Leaves are stored one row per path in `tree_nodes`; a sub-tree read is a
//! prefix scan over the primary key. Every write runs in a transaction so a
//! failed update leaves the tree untouched.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnection, SqlitePool};
use std::path::Path;
use tracing::debug;

use super::{ancestors, assemble, child_path, flatten, validate_path, TreeStore};
use crate::error::Result;
use crate::sqlite::{memory_pool, open_pool, subtree_range};

/// SQLite implementation of TreeStore.
pub struct SqliteTree {
    pool: SqlitePool,
}

impl SqliteTree {
    /// Open or create a tree store at the given path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            pool: open_pool(path.as_ref()).await?,
        };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create an in-memory tree store (for testing).
    pub async fn in_memory() -> Result<Self> {
        let store = Self {
            pool: memory_pool().await?,
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tree_nodes (
                path TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("SQLite tree schema initialized");
        Ok(())
    }

    async fn delete_subtree(conn: &mut SqliteConnection, path: &str) -> Result<()> {
        let (low, high) = subtree_range(path);
        sqlx::query("DELETE FROM tree_nodes WHERE path = ? OR (path >= ? AND path < ?)")
            .bind(path)
            .bind(low)
            .bind(high)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn write(
        conn: &mut SqliteConnection,
        path: &str,
        leaves: Vec<(String, Value)>,
    ) -> Result<()> {
        Self::delete_subtree(conn, path).await?;
        for ancestor in ancestors(path) {
            sqlx::query("DELETE FROM tree_nodes WHERE path = ?")
                .bind(ancestor)
                .execute(&mut *conn)
                .await?;
        }

        let now = Utc::now().timestamp_millis();
        for (leaf_path, value) in leaves {
            sqlx::query("INSERT INTO tree_nodes (path, value, updated_at) VALUES (?, ?, ?)")
                .bind(&leaf_path)
                .bind(serde_json::to_string(&value)?)
                .bind(now)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TreeStore for SqliteTree {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        validate_path(path)?;

        let (low, high) = subtree_range(path);
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT path, value FROM tree_nodes \
             WHERE path = ? OR (path >= ? AND path < ?) ORDER BY path",
        )
        .bind(path)
        .bind(low)
        .bind(high)
        .fetch_all(&self.pool)
        .await?;

        let mut leaves = Vec::with_capacity(rows.len());
        for (leaf_path, raw) in rows {
            leaves.push((leaf_path, serde_json::from_str(&raw)?));
        }
        Ok(assemble(path, leaves))
    }

    async fn set(&self, path: &str, value: Value) -> Result<()> {
        validate_path(path)?;
        let leaves = flatten(path, value)?;

        let mut tx = self.pool.begin().await?;
        Self::write(&mut tx, path, leaves).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<()> {
        validate_path(path)?;

        let mut writes = Vec::with_capacity(fields.len());
        for (key, value) in fields {
            let child = child_path(path, &key);
            validate_path(&child)?;
            let leaves = flatten(&child, value)?;
            writes.push((child, leaves));
        }

        let mut tx = self.pool.begin().await?;
        for (child, leaves) in writes {
            Self::write(&mut tx, &child, leaves).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        validate_path(path)?;

        let mut conn = self.pool.acquire().await?;
        Self::delete_subtree(&mut conn, path).await
    }
}
