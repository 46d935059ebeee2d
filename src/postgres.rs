//! PostgreSQL content store implementation.
//!
//! Targets hosted Postgres services that require TLS but present
//! certificates the client cannot verify, so TLS is negotiated in
//! `require` mode (encrypted, unverified) unless disabled.
//!
//! The pool connects lazily: a database that is unreachable at start-up
//! does not stop the process, the first query simply fails.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::store::{Content, ContentStore};

type ContentRow = (i64, String, DateTime<Utc>);

/// Columns in [`ContentRow`] order. Tables created as `SERIAL`/`TIMESTAMP`
/// are widened here so they decode the same as `BIGSERIAL`/`TIMESTAMPTZ`.
const COLUMNS: &str = "id::int8 AS id, description, created_at::timestamptz AS created_at";

/// PostgreSQL implementation of ContentStore.
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    /// Build connection options from a connection string.
    ///
    /// With `require_tls` the connection is encrypted without certificate
    /// verification; otherwise TLS is used only if the server offers it.
    pub fn connect_options(database_url: &str, require_tls: bool) -> Result<PgConnectOptions> {
        let options = PgConnectOptions::from_str(database_url)
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        let mode = if require_tls {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };
        Ok(options.ssl_mode(mode))
    }

    /// Create a store over a lazily connected pool.
    pub fn connect(database_url: &str, require_tls: bool) -> Result<Self> {
        let options = Self::connect_options(database_url, require_tls)?;
        Ok(Self::connect_with(options))
    }

    /// Create a store over a lazily connected pool with prepared options.
    pub fn connect_with(options: PgConnectOptions) -> Self {
        info!(
            host = %options.get_host(),
            database = ?options.get_database(),
            "Configuring PostgreSQL pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy_with(options);

        Self { pool }
    }
}

fn row_to_content((id, description, created_at): ContentRow) -> Content {
    Content {
        id,
        description,
        created_at,
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS content (
                id BIGSERIAL PRIMARY KEY,
                description TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("PostgreSQL content schema initialized");
        Ok(())
    }

    async fn insert(&self, description: &str) -> Result<Content> {
        let row: ContentRow = sqlx::query_as(&format!(
            "INSERT INTO content (description) VALUES ($1) RETURNING {COLUMNS}"
        ))
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_content(row))
    }

    async fn list_all(&self) -> Result<Vec<Content>> {
        let rows: Vec<ContentRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM content ORDER BY id ASC"))
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(row_to_content).collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Content>> {
        let row: Option<ContentRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM content WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(row_to_content))
    }

    async fn update(&self, id: i64, description: &str) -> Result<Option<Content>> {
        let row: Option<ContentRow> = sqlx::query_as(&format!(
            "UPDATE content SET description = $1 WHERE id = $2 RETURNING {COLUMNS}"
        ))
        .bind(description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(row_to_content))
    }

    async fn delete(&self, id: i64) -> Result<Option<Content>> {
        let row: Option<ContentRow> = sqlx::query_as(&format!(
            "DELETE FROM content WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(row_to_content))
    }
}
