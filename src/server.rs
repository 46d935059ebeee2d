//! HTTP server hosting one API variant.
//!
//! The store is built before the server and handed in as an [`Api`]; the
//! server only wires routes, middleware and static files around it.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::store::{ContentStore, DeckStore};

const DEFAULT_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 3000);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub addr: SocketAddr,
    /// Enable CORS.
    pub cors: bool,
    /// Directory of static pages and assets.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(DEFAULT_ADDR),
            cors: true,
            static_dir: PathBuf::from("public"),
        }
    }
}

impl ServerConfig {
    /// Creates a new server config builder.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for ServerConfig.
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    addr: Option<SocketAddr>,
    cors: Option<bool>,
    static_dir: Option<PathBuf>,
}

impl ServerConfigBuilder {
    /// Sets the listen address.
    pub fn addr(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    /// Sets whether CORS is enabled.
    pub fn cors(mut self, enabled: bool) -> Self {
        self.cors = Some(enabled);
        self
    }

    /// Sets the static file directory.
    pub fn static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Builds the server config.
    pub fn build(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            addr: self.addr.unwrap_or(defaults.addr),
            cors: self.cors.unwrap_or(defaults.cors),
            static_dir: self.static_dir.unwrap_or(defaults.static_dir),
        }
    }
}

/// The API variant a server exposes, with its store.
#[derive(Clone)]
pub enum Api {
    /// Flat `/api/content` table.
    Content(Arc<dyn ContentStore>),
    /// Hierarchical `/api/decks` tree.
    Decks(Arc<dyn DeckStore>),
}

impl Api {
    fn name(&self) -> &'static str {
        match self {
            Api::Content(_) => "content",
            Api::Decks(_) => "decks",
        }
    }
}

/// The HTTP server.
pub struct Server {
    config: ServerConfig,
    api: Api,
}

impl Server {
    /// Creates a new server exposing `api`.
    pub fn new(config: ServerConfig, api: Api) -> Self {
        Self { config, api }
    }

    /// Creates the router.
    pub fn router(&self) -> Router {
        let static_dir = &self.config.static_dir;

        let mut router = match &self.api {
            Api::Content(store) => api::content::routes(store.clone()),
            Api::Decks(store) => api::decks::routes(store.clone())
                .route_service("/", ServeFile::new(static_dir.join("index.html")))
                .route_service("/deck", ServeFile::new(static_dir.join("deck.html"))),
        }
        .route("/health", get(api::health))
        .fallback_service(ServeDir::new(static_dir));

        router = router.layer(TraceLayer::new_for_http());

        if self.config.cors {
            router = router.layer(CorsLayer::permissive());
        }

        router
    }

    /// Runs the server until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound or the server fails.
    pub async fn run(self) -> std::io::Result<()> {
        let router = self.router();

        let listener = tokio::net::TcpListener::bind(self.config.addr).await?;
        tracing::info!(
            addr = %self.config.addr,
            api = self.api.name(),
            "Server running on http://{}",
            self.config.addr
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down gracefully"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down gracefully"),
    }
}
