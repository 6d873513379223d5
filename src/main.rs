//! Binary entry point for vecdb.
//!
//! This binary provides a JSON-in, JSON-out CLI over a single container file.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr/print_stdout in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    cmd_compare, cmd_delete, cmd_get, cmd_info, cmd_most, cmd_store, cmd_update, resolve_metric,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use vecdb::observability::{self, LoggingConfig};
use vecdb::{VecDb, VecdbConfig};

/// vecdb - A minimal embedding-vector store.
#[derive(Parser)]
#[command(name = "vecdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the container file.
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    /// Embedding dimension.
    #[arg(short, long, global = true)]
    dim: Option<usize>,

    /// Collection to operate on.
    #[arg(long, global = true)]
    collection: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Append one vector or a batch, printing the last index.
    Store {
        /// JSON vector (`[..]`) or batch (`[[..], ..]`).
        vectors: String,
    },

    /// Print one row, or every row when no index is given.
    Get {
        /// Row index.
        index: Option<usize>,
    },

    /// Overwrite a row.
    Update {
        /// Row index.
        index: usize,

        /// JSON vector.
        vector: String,
    },

    /// Tombstone a row.
    Delete {
        /// Row index.
        index: usize,
    },

    /// Rank every live row against a query.
    Compare {
        /// JSON query vector.
        query: String,

        /// Scorer: cosine, dot, euclidean, or neg-euclidean.
        #[arg(short, long)]
        metric: Option<String>,

        /// Rank lowest scores first.
        #[arg(long)]
        asc: bool,
    },

    /// Print the top-n indices for a query.
    Most {
        /// JSON query vector.
        query: String,

        /// Number of indices; 1 prints a bare index.
        #[arg(short, default_value = "1")]
        n: usize,

        /// Scorer: cosine, dot, euclidean, or neg-euclidean.
        #[arg(short, long)]
        metric: Option<String>,

        /// Rank lowest scores first.
        #[arg(long)]
        asc: bool,
    },

    /// Show collections with row and live counts.
    Info,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init(LoggingConfig::from_settings(
        Some(&config.logging),
        cli.verbose,
    )) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(command: Commands, config: &VecdbConfig) -> commands::CmdResult {
    let db = VecDb::open(&config.path, config.require_emb_dim()?)?;
    let collection = config.collection.as_str();

    match command {
        Commands::Store { vectors } => cmd_store(&db, collection, &vectors),

        Commands::Get { index } => cmd_get(&db, collection, index),

        Commands::Update { index, vector } => cmd_update(&db, collection, index, &vector),

        Commands::Delete { index } => cmd_delete(&db, collection, index),

        Commands::Compare { query, metric, asc } => {
            let metric = resolve_metric(metric.as_deref(), config.metric)?;
            cmd_compare(&db, collection, &query, metric, asc)
        },

        Commands::Most {
            query,
            n,
            metric,
            asc,
        } => {
            let metric = resolve_metric(metric.as_deref(), config.metric)?;
            cmd_most(&db, collection, &query, n, metric, asc)
        },

        Commands::Info => cmd_info(&db),
    }
}

/// Loads configuration: file, then `VECDB_*` environment, then flags.
fn load_config(cli: &Cli) -> Result<VecdbConfig, Box<dyn std::error::Error>> {
    let mut config = if let Some(config_path) = &cli.config {
        VecdbConfig::load_from_file(config_path)?
    } else if let Some(config_path) = std::env::var("VECDB_CONFIG_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
    {
        VecdbConfig::load_from_file(Path::new(&config_path))?
    } else {
        VecdbConfig::load_default()
    };

    config.apply_env()?;

    if let Some(path) = &cli.path {
        config.path.clone_from(path);
    }
    if let Some(dim) = cli.dim {
        config.emb_dim = Some(dim);
    }
    if let Some(collection) = &cli.collection {
        config.collection.clone_from(collection);
    }

    Ok(config)
}
