//! Process start-up: build the configured store once and hand it to the
//! server.

use std::sync::Arc;

use tracing::{error, info};

use crate::config::{Config, ContentBackend, TreeBackend};
use crate::decks::TreeDeckStore;
use crate::error::{Result, StoreError};
use crate::postgres::PgContentStore;
use crate::server::{Api, Server};
use crate::sqlite::SqliteContentStore;
use crate::store::{ContentStore, DeckStore};
use crate::tree::{MemoryTree, RestTree, RestTreeConfig, SqliteTree};

/// Build the flat-variant store and make sure its table exists.
///
/// A schema failure is logged, not returned: the server still starts and
/// answers 500 until the database is reachable.
pub async fn content_store(config: &Config) -> Result<Arc<dyn ContentStore>> {
    let store: Arc<dyn ContentStore> = match config.content_backend {
        ContentBackend::Postgres => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                StoreError::ConnectionError(
                    "database_url must be set for the postgres backend".to_string(),
                )
            })?;
            Arc::new(PgContentStore::connect(url, config.database_tls)?)
        }
        ContentBackend::Sqlite => Arc::new(SqliteContentStore::open(&config.sqlite_path).await?),
    };

    match store.ensure_schema().await {
        Ok(()) => info!("Database table 'content' is ready"),
        Err(e) => error!(error = %e, "Error initializing database"),
    }

    Ok(store)
}

/// Build the hierarchical-variant store. The tree needs no schema step
/// beyond what opening the backend does.
pub async fn deck_store(config: &Config) -> Result<Arc<dyn DeckStore>> {
    let store: Arc<dyn DeckStore> = match config.tree_backend {
        TreeBackend::Memory => Arc::new(TreeDeckStore::new(MemoryTree::new())),
        TreeBackend::Sqlite => Arc::new(TreeDeckStore::new(
            SqliteTree::open(&config.tree_path).await?,
        )),
        TreeBackend::Firebase => {
            let url = config.firebase_url.as_deref().ok_or_else(|| {
                StoreError::ConnectionError(
                    "firebase_url must be set for the firebase backend".to_string(),
                )
            })?;
            let mut rest = RestTreeConfig::new(url).with_timeout_secs(config.request_timeout_secs);
            if let Some(token) = &config.firebase_token {
                rest = rest.with_access_token(token.clone());
            }
            Arc::new(TreeDeckStore::new(RestTree::new(rest)?))
        }
    };

    info!(backend = ?config.tree_backend, "Deck store ready");
    Ok(store)
}

/// Server for the flat variant.
pub async fn content_server(config: &Config) -> Result<Server> {
    let store = content_store(config).await?;
    Ok(Server::new(config.server_config(), Api::Content(store)))
}

/// Server for the hierarchical variant.
pub async fn deck_server(config: &Config) -> Result<Server> {
    let store = deck_store(config).await?;
    Ok(Server::new(config.server_config(), Api::Decks(store)))
}
