//! Service configuration.
//!
//! Configuration is loaded from (in order of precedence):
//! 1. Command-line arguments (applied by the binary)
//! 2. `PORT` and `DATABASE_URL`
//! 3. Environment variables (`CONTENT_DECKS_*`)
//! 4. Config file (`content-decks.toml` or `--config <path>`)
//! 5. Default values

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::server::ServerConfig;

/// Config file read when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "content-decks.toml";

/// Prefix of the environment variables that map onto config keys.
pub const ENV_PREFIX: &str = "CONTENT_DECKS_";

/// Relational backend of the flat variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentBackend {
    Postgres,
    Sqlite,
}

/// Tree backend of the hierarchical variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeBackend {
    Memory,
    Sqlite,
    Firebase,
}

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub server_host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub server_port: u16,

    /// Answer cross-origin requests.
    #[serde(default = "default_true")]
    pub cors: bool,

    /// Directory of static pages.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Backend of the flat content table.
    #[serde(default = "default_content_backend")]
    pub content_backend: ContentBackend,

    /// PostgreSQL connection string.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Require TLS (without certificate verification) for PostgreSQL.
    #[serde(default = "default_true")]
    pub database_tls: bool,

    /// SQLite file of the flat content table.
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,

    /// Backend of the deck tree.
    #[serde(default = "default_tree_backend")]
    pub tree_backend: TreeBackend,

    /// SQLite file of the deck tree.
    #[serde(default = "default_tree_path")]
    pub tree_path: PathBuf,

    /// Realtime database root URL.
    #[serde(default)]
    pub firebase_url: Option<String>,

    /// Access token for the realtime database.
    #[serde(default)]
    pub firebase_token: Option<String>,

    /// Timeout of requests to remote backends.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_content_backend() -> ContentBackend {
    ContentBackend::Sqlite
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("content.db")
}

fn default_tree_backend() -> TreeBackend {
    TreeBackend::Sqlite
}

fn default_tree_path() -> PathBuf {
    PathBuf::from("decks.db")
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: default_host(),
            server_port: default_port(),
            cors: true,
            static_dir: default_static_dir(),
            content_backend: default_content_backend(),
            database_url: None,
            database_tls: true,
            sqlite_path: default_sqlite_path(),
            tree_backend: default_tree_backend(),
            tree_path: default_tree_path(),
            firebase_url: None,
            firebase_token: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Config {
    /// Layers every configuration source, lowest precedence first.
    pub fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Env::raw().only(&["DATABASE_URL"]))
            .merge(Env::raw().only(&["PORT"]).map(|_| "server_port".into()))
    }

    /// Loads configuration from all sources.
    ///
    /// Logs a warning for configuration errors and falls back to defaults.
    pub fn load(config_path: Option<&Path>) -> Self {
        let config_path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        match Self::figment(config_path).extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    file = %config_path.display(),
                    error = %e,
                    "Configuration error, using defaults"
                );
                Config::default()
            }
        }
    }

    /// Socket address built from host and port.
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.server_host, self.server_port)
    }

    /// HTTP settings for [`crate::server::Server`].
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::builder()
            .addr(self.addr())
            .cors(self.cors)
            .static_dir(self.static_dir.clone())
            .build()
    }
}

/// Renders the effective configuration, with secrets masked.
pub fn describe(config: &Config) -> String {
    fn mask(value: &Option<String>) -> &'static str {
        if value.is_some() {
            "(set)"
        } else {
            "(not set)"
        }
    }

    let lines = [
        format!("  server_host: {}", config.server_host),
        format!("  server_port: {}", config.server_port),
        format!("  cors: {}", config.cors),
        format!("  static_dir: {}", config.static_dir.display()),
        format!("  content_backend: {:?}", config.content_backend),
        format!("  database_url: {}", mask(&config.database_url)),
        format!("  database_tls: {}", config.database_tls),
        format!("  sqlite_path: {}", config.sqlite_path.display()),
        format!("  tree_backend: {:?}", config.tree_backend),
        format!("  tree_path: {}", config.tree_path.display()),
        format!(
            "  firebase_url: {}",
            config.firebase_url.as_deref().unwrap_or("(not set)")
        ),
        format!("  firebase_token: {}", mask(&config.firebase_token)),
        format!("  request_timeout_secs: {}", config.request_timeout_secs),
    ];
    lines.join("\n")
}
