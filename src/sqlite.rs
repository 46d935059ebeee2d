//! SQLite content store implementation.
//!
//! Backs the flat variant with a single `content` table. `AUTOINCREMENT`
//! keeps ids strictly increasing and never reuses the id of a deleted row.
//!
//! The pool helpers here are shared with [`crate::tree::SqliteTree`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::store::{Content, ContentStore};

/// Open or create a SQLite database file in WAL mode.
pub(crate) async fn open_pool(path: &Path) -> Result<SqlitePool> {
    info!("Opening SQLite database at {:?}", path);

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .map_err(|e| StoreError::ConnectionError(e.to_string()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30));

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| StoreError::ConnectionError(e.to_string()))
}

/// Create a pool over a private in-memory database.
///
/// Every SQLite connection to `:memory:` sees its own database, so the pool
/// holds exactly one connection and never recycles it.
pub(crate) async fn memory_pool() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| StoreError::ConnectionError(e.to_string()))
}

/// Bounds of every row strictly below `path`, for `path >= ? AND path < ?`.
///
/// TEXT comparison uses the BINARY collation, so the match is byte-wise and
/// case-sensitive. `'0'` is the byte after `'/'`.
pub(crate) fn subtree_range(path: &str) -> (String, String) {
    (format!("{}/", path), format!("{}0", path))
}

type ContentRow = (i64, String, i64);

/// SQLite implementation of ContentStore.
pub struct SqliteContentStore {
    pool: SqlitePool,
}

impl SqliteContentStore {
    /// Open or create a content store at the given path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let pool = open_pool(path.as_ref()).await?;
        Ok(Self { pool })
    }

    /// Create an in-memory content store with its schema in place.
    pub async fn in_memory() -> Result<Self> {
        let store = Self {
            pool: memory_pool().await?,
        };
        store.ensure_schema().await?;
        Ok(store)
    }

    fn now_millis() -> i64 {
        Utc::now().timestamp_millis()
    }

    fn row_to_content((id, description, created_at): ContentRow) -> Result<Content> {
        let created_at = DateTime::<Utc>::from_timestamp_millis(created_at).ok_or_else(|| {
            StoreError::SerializationError(format!(
                "content {} has out-of-range created_at {}",
                id, created_at
            ))
        })?;
        Ok(Content {
            id,
            description,
            created_at,
        })
    }
}

#[async_trait]
impl ContentStore for SqliteContentStore {
    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS content (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                description TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("SQLite content schema initialized");
        Ok(())
    }

    async fn insert(&self, description: &str) -> Result<Content> {
        let row: ContentRow = sqlx::query_as(
            "INSERT INTO content (description, created_at) VALUES (?, ?) \
             RETURNING id, description, created_at",
        )
        .bind(description)
        .bind(Self::now_millis())
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_content(row)
    }

    async fn list_all(&self) -> Result<Vec<Content>> {
        let rows: Vec<ContentRow> =
            sqlx::query_as("SELECT id, description, created_at FROM content ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Self::row_to_content).collect()
    }

    async fn get(&self, id: i64) -> Result<Option<Content>> {
        let row: Option<ContentRow> =
            sqlx::query_as("SELECT id, description, created_at FROM content WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_content).transpose()
    }

    async fn update(&self, id: i64, description: &str) -> Result<Option<Content>> {
        let row: Option<ContentRow> = sqlx::query_as(
            "UPDATE content SET description = ? WHERE id = ? \
             RETURNING id, description, created_at",
        )
        .bind(description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_content).transpose()
    }

    async fn delete(&self, id: i64) -> Result<Option<Content>> {
        let row: Option<ContentRow> =
            sqlx::query_as("DELETE FROM content WHERE id = ? RETURNING id, description, created_at")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_content).transpose()
    }
}
