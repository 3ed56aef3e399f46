use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seqlink::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "seqlink",
    version,
    about = "Per-category sequential permalinks with legacy redirects and retired-path handling",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve permalinks and the admin API
    Serve,

    /// Show how a request path would be routed
    Resolve {
        /// Request path, optionally with a query string (`/news/7/?utm=x`)
        path: String,
    },

    /// Print an item's canonical permalink
    Permalink {
        /// Item ID
        id: u64,
    },

    /// Run the save handler for an item
    Save {
        /// Item ID
        id: u64,

        /// Primary category override
        #[arg(long)]
        primary: Option<u64>,

        /// Manual sequence (slides upward when taken)
        #[arg(long)]
        sequence: Option<i64>,
    },

    /// Delete an item and release its sequences
    DeleteItem {
        /// Item ID
        id: u64,
    },

    /// Delete a category and release every sequence scoped to it
    DeleteCategory {
        /// Category ID
        id: u64,
    },

    /// Load categories and items from a JSON file
    Import {
        /// JSON file with `categories` and `items`
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env()?;

    // Initialize tracing/logging
    let format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&format, &config.logging.level, cli.verbose)?;

    config.validate()?;
    tracing::info!(config = ?cli.config, "seqlink starting");

    match cli.command {
        Commands::Serve => commands::serve(config).await?,
        Commands::Resolve { path } => commands::resolve(config, &path)?,
        Commands::Permalink { id } => commands::permalink(config, id)?,
        Commands::Save {
            id,
            primary,
            sequence,
        } => {
            tracing::info!(item_id = id, primary = ?primary, sequence = ?sequence, "Starting save command");
            commands::save(config, id, primary, sequence)?;
        }
        Commands::DeleteItem { id } => commands::delete_item(config, id)?,
        Commands::DeleteCategory { id } => commands::delete_category(config, id)?,
        Commands::Import { file } => commands::import(config, &file)?,
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if verbose => tracing_subscriber::EnvFilter::new("seqlink=debug,info"),
        Err(_) => tracing_subscriber::EnvFilter::try_new(format!("seqlink={level},warn"))?,
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
