//! tiki-harvest main entry point
//!
//! This is the command-line interface for the tiki-harvest catalog crawler.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tiki_harvest::config::{load_config_with_hash, validate, Config};
use tiki_harvest::output::{
    load_statistics, print_harvest_summary, print_product_summary, print_statistics,
    print_walk_summary,
};
use tiki_harvest::storage::{open_storage, SqliteStorage};
use tiki_harvest::Harvester;
use tracing_subscriber::EnvFilter;

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG_FILE: &str = "tiki-harvest.toml";

/// tiki-harvest: a resumable e-commerce catalog crawler
///
/// Walks the shop's category tree, then paginates every leaf category and
/// stores its products in SQLite. Re-running continues where the previous
/// run stopped.
#[derive(Parser, Debug)]
#[command(name = "tiki-harvest")]
#[command(version)]
#[command(about = "A resumable e-commerce catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Walk the category tree if none is stored, then paginate (default)
    Crawl,
    /// Walk the category tree only
    Categories,
    /// Paginate the stored leaf categories only
    Products,
    /// Show statistics from the database and exit
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = resolve_config(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Crawl) {
        Command::Stats => handle_stats(&config),
        command => handle_crawl(&config, command).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tiki_harvest=info,warn"),
            1 => EnvFilter::new("tiki_harvest=debug,info"),
            2 => EnvFilter::new("tiki_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration from `--config`, the default file, or built-in defaults
fn resolve_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    let path = match path {
        Some(path) => Some(path),
        None if default_path.exists() => Some(default_path),
        None => None,
    };

    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            tracing::info!("No configuration file, using built-in defaults");
            let config = Config::default();
            validate(&config)?;
            Ok(config)
        }
    }
}

fn open_database(config: &Config) -> anyhow::Result<SqliteStorage> {
    let path = Path::new(&config.output.database_path);
    open_storage(path).with_context(|| format!("Failed to open database {}", path.display()))
}

/// Handles the `stats` subcommand: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_database(config)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the crawling subcommands
async fn handle_crawl(config: &Config, command: Command) -> anyhow::Result<()> {
    let storage = open_database(config)?;
    let mut harvester = Harvester::new(config, storage)?;

    tracing::info!(
        "Crawling {} into {}",
        config.site.base_url,
        config.output.database_path
    );

    match command {
        Command::Categories => {
            let walk = harvester.crawl_categories().await?;
            print_walk_summary(&walk);
        }
        Command::Products => {
            let products = harvester.crawl_products().await?;
            print_product_summary(&products);
        }
        _ => {
            let summary = harvester.run().await?;
            print_harvest_summary(&summary);
        }
    }

    Ok(())
}
