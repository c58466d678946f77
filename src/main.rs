//! # foodex CLI
//!
//! Command-line interface for the OpenFoodFacts SQLite exporter.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `foodex export` | Stream the TSV dump into a fresh SQLite database |
//! | `foodex search "<query>"` | Full-text search the exported database |
//! | `foodex stats` | Show row counts and database size |
//!
//! ## Examples
//!
//! ```bash
//! # Export the dump, filtering to German products
//! foodex export --csv ~/Downloads/products.csv --sqlite ./food.sqlite
//!
//! # Smaller batches for constrained machines
//! foodex export --csv products.csv --sqlite food.sqlite --batch 1000
//!
//! # Search product names
//! foodex search "oat milk" --sqlite ./food.sqlite
//!
//! # Search brand names instead
//! foodex search "oatly" --index brands --sqlite ./food.sqlite
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use foodex::{config, pipeline, search, stats};

/// foodex — export the OpenFoodFacts TSV dump into SQLite with lookup
/// tables and full-text search.
///
/// Settings can come from an optional TOML config file (`--config`); any
/// flag given on the command line overrides the file.
#[derive(Parser)]
#[command(
    name = "foodex",
    about = "OpenFoodFacts TSV to SQLite exporter with FTS5 search",
    version
)]
struct Cli {
    /// Path to an optional configuration file (TOML) with [source], [db],
    /// and [batch] sections.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Export the TSV dump into a fresh SQLite database.
    ///
    /// Drops and rebuilds every output table: the primary food table, the
    /// brand/category/store lookup and pivot tables, and the four FTS5
    /// search indexes. Re-running against the same input reproduces the
    /// same database.
    Export {
        /// Path to the tab-separated input file. Supports `~` expansion.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Path to the output SQLite file. Supports `~` expansion.
        #[arg(long)]
        sqlite: Option<PathBuf>,

        /// Number of rows accumulated per batch before flushing.
        #[arg(long)]
        batch: Option<usize>,

        /// Country substring that `countries_en` must contain.
        #[arg(long)]
        country: Option<String>,
    },

    /// Full-text search an exported database.
    Search {
        /// The search query string (FTS5 match syntax).
        query: String,

        /// Which index to search: `food`, `brands`, `categories`, or `stores`.
        #[arg(long, default_value = "food")]
        index: String,

        /// Path to the SQLite file (overrides config).
        #[arg(long)]
        sqlite: Option<PathBuf>,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Show row counts and database size for an exported database.
    Stats {
        /// Path to the SQLite file (overrides config).
        #[arg(long)]
        sqlite: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::Config::default(),
    };

    match cli.command {
        Commands::Export {
            csv,
            sqlite,
            batch,
            country,
        } => {
            if let Some(csv) = csv {
                cfg.source.path = Some(csv);
            }
            if let Some(sqlite) = sqlite {
                cfg.db.path = Some(sqlite);
            }
            if let Some(batch) = batch {
                cfg.batch.size = batch;
            }
            if let Some(country) = country {
                cfg.source.country = country;
            }
            config::validate(&cfg)?;
            pipeline::run_export(&cfg).await?;
        }
        Commands::Search {
            query,
            index,
            sqlite,
            limit,
        } => {
            if let Some(sqlite) = sqlite {
                cfg.db.path = Some(sqlite);
            }
            search::run_search(&cfg, &query, &index, limit).await?;
        }
        Commands::Stats { sqlite } => {
            if let Some(sqlite) = sqlite {
                cfg.db.path = Some(sqlite);
            }
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
