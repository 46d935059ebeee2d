//! # content-decks
//!
//! Serves either the flat content API or the deck API.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;

use content_decks::bootstrap;
use content_decks::config::{self, Config};
use content_decks::telemetry::{init_logging, TelemetryConfig};

#[derive(Parser)]
#[command(name = "content-decks")]
#[command(version)]
#[command(about = "CRUD HTTP services for content items and decks", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, global = true)]
    json_logs: bool,

    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the flat content API backed by a relational table
    Content {
        #[command(flatten)]
        listen: Listen,

        /// PostgreSQL connection string (selects the postgres backend)
        #[arg(long)]
        database_url: Option<String>,
    },

    /// Serve the deck API backed by a hierarchical store
    Decks {
        #[command(flatten)]
        listen: Listen,
    },

    /// Show the effective configuration
    Config,
}

#[derive(clap::Args)]
struct Listen {
    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<IpAddr>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,
}

impl Listen {
    fn apply(self, cfg: &mut Config) {
        if let Some(host) = self.host {
            cfg.server_host = host;
        }
        if let Some(port) = self.port {
            cfg.server_port = port;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let telemetry = TelemetryConfig::new("content-decks").with_log_level(&cli.log_level);
    let telemetry = if cli.json_logs {
        telemetry.with_json_logs()
    } else {
        telemetry
    };
    init_logging(&telemetry)?;

    let mut cfg = Config::load(cli.config.as_deref());

    match cli.command {
        Commands::Content {
            listen,
            database_url,
        } => {
            listen.apply(&mut cfg);
            if let Some(url) = database_url {
                cfg.database_url = Some(url);
                cfg.content_backend = config::ContentBackend::Postgres;
            }
            bootstrap::content_server(&cfg).await?.run().await?;
        }

        Commands::Decks { listen } => {
            listen.apply(&mut cfg);
            bootstrap::deck_server(&cfg).await?.run().await?;
        }

        Commands::Config => {
            println!("content-decks configuration\n");
            println!("{}", config::describe(&cfg));
        }
    }

    Ok(())
}
