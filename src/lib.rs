//! # content-decks
//!
//! Two small CRUD services over user-entered content items:
//!
//! - **Flat**: one relational `content` table served at `/api/content`
//! - **Decks**: content grouped into decks, kept in a two-level tree and
//!   served at `/api/decks`
//!
//! A deployment runs one of them. Handlers talk to the store only through
//! [`ContentStore`] or [`DeckStore`], which are built once at start-up and
//! injected into the router.
//!
//! ## Backends
//!
//! - [`SqliteContentStore`], [`PgContentStore`]: the flat table
//! - [`TreeDeckStore`] over a [`TreeStore`]: [`MemoryTree`] (testing),
//!   [`SqliteTree`] (embedded), [`RestTree`] (hosted realtime database)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use content_decks::{DeckStore, MemoryTree, TreeDeckStore};
//!
//! #[tokio::main]
//! async fn main() -> content_decks::Result<()> {
//!     let decks = TreeDeckStore::new(MemoryTree::new());
//!
//!     let deck = decks.create_deck("Spanish").await?;
//!     decks.add_content(&deck.id, "hola").await?;
//!
//!     for summary in decks.list_decks().await? {
//!         println!("{} ({} items)", summary.title, summary.content_count);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Serving
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use content_decks::{Api, Server, ServerConfig, SqliteContentStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteContentStore::in_memory().await?;
//!     let server = Server::new(ServerConfig::default(), Api::Content(Arc::new(store)));
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod decks;
pub mod error;
pub mod postgres;
pub mod server;
pub mod sqlite;
pub mod store;
pub mod telemetry;
pub mod tree;

// Re-export main types
pub use decks::TreeDeckStore;
pub use error::{Result, StoreError};
pub use postgres::PgContentStore;
pub use server::{Api, Server, ServerConfig};
pub use sqlite::SqliteContentStore;
pub use store::{
    Content, ContentStore, Deck, DeckContent, DeckStore, DeckSummary, DeckWithContents,
};
pub use tree::{MemoryTree, RestTree, RestTreeConfig, SqliteTree, TreeStore};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::decks::TreeDeckStore;
    pub use crate::error::{Result, StoreError};
    pub use crate::store::{
        Content, ContentStore, Deck, DeckContent, DeckStore, DeckSummary, DeckWithContents,
    };
    pub use crate::tree::{MemoryTree, SqliteTree, TreeStore};
}
