//! Corpus-Mirror main entry point
//!
//! This is the command-line interface for discovering, converting and re-syncing a corpus of
//! documents held in a remote document store.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use corpus_mirror::config::{load_config_with_hash, validate, Config};
use corpus_mirror::output::{
    print_conversion_report, print_discovery_statistics, print_sync_report, read_conversion_records,
    read_seeds, write_discovery_records, DiscoveryStatistics,
};
use corpus_mirror::{Converter, CorpusError, Discoverer, HttpStoreClient, StoreClient, Syncer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Corpus-Mirror: a document-store crawler and Markdown corpus builder
///
/// Corpus-Mirror walks folders and embedded links in a remote document store, writes an
/// inventory of everything it finds, and turns an inventory into a directory of Markdown files
/// that link to each other by relative path.
#[derive(Parser, Debug)]
#[command(name = "corpus-mirror")]
#[command(version)]
#[command(about = "A document-store crawler and Markdown corpus builder", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk the store from a list of seed URLs and write a discovery inventory
    Discover {
        /// CSV file with one seed URL per row
        #[arg(long)]
        input: PathBuf,

        /// Where to write the discovery inventory
        #[arg(long)]
        output: PathBuf,

        /// Override the maximum link depth
        #[arg(long)]
        depth: Option<u32>,
    },

    /// Materialize an inventory as Markdown files
    Convert(BatchArgs),

    /// Refresh previously materialized files whose remote document changed
    Sync(BatchArgs),

    /// Validate the configuration and print the effective settings
    Check,
}

/// Options shared by the batch commands
#[derive(Args, Debug)]
struct BatchArgs {
    /// Conversion inventory CSV (link, title, fragments, tags)
    #[arg(long)]
    input: PathBuf,

    /// Override the output directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Override the number of concurrent workers
    #[arg(long)]
    workers: Option<usize>,

    /// Do everything except write files
    #[arg(long)]
    dry_run: bool,
}

impl BatchArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.conversion.output_dir = dir.clone();
        }
        if let Some(workers) = self.workers {
            config.conversion.workers = workers;
        }
        if self.dry_run {
            config.conversion.dry_run = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    match cli.command {
        Command::Check => handle_check(&config, &config_hash),
        Command::Discover {
            input,
            output,
            depth,
        } => {
            if let Some(depth) = depth {
                config.discovery.max_depth = depth;
            }
            validate(&config)?;
            handle_discover(&config, &input, &output).await
        }
        Command::Convert(args) => {
            args.apply(&mut config);
            validate(&config)?;
            handle_convert(&config, &args.input).await
        }
        Command::Sync(args) => {
            args.apply(&mut config);
            validate(&config)?;
            handle_sync(&config, &args.input).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("corpus_mirror=info,warn"),
            1 => EnvFilter::new("corpus_mirror=debug,info"),
            2 => EnvFilter::new("corpus_mirror=trace,debug"),
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

/// Builds the HTTP store client, reading the token from the configured environment variable
fn connect(config: &Config) -> anyhow::Result<Arc<dyn StoreClient>> {
    let token = std::env::var(&config.store.token_env)
        .map_err(|_| CorpusError::MissingToken(config.store.token_env.clone()))?;
    let client = HttpStoreClient::from_config(&config.store, &token)
        .context("Failed to build store client")?;
    Ok(Arc::new(client))
}

/// Handles `check`: shows the effective configuration
fn handle_check(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    println!("=== Corpus-Mirror Configuration ===\n");

    println!("Store:");
    println!("  API base: {}", config.store.api_base);
    println!("  Token variable: {}", config.store.token_env);
    println!(
        "  Token present: {}",
        if std::env::var_os(&config.store.token_env).is_some() {
            "yes"
        } else {
            "no"
        }
    );
    println!("  Page size: {}", config.store.page_size);
    println!("  Request timeout: {}s", config.store.request_timeout_secs);

    println!("\nAllowed Hosts ({}):", config.store.allowed_hosts.len());
    for host in &config.store.allowed_hosts {
        println!("  - {}", host);
    }

    println!("\nRetry:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!("  Base delay: {}ms", config.retry.base_delay_ms);

    println!("\nDiscovery:");
    println!("  Max depth: {}", config.discovery.max_depth);
    println!(
        "  Clone binary documents: {}",
        config.discovery.clone_binary_documents
    );

    println!("\nConversion:");
    println!("  Output directory: {}", config.conversion.output_dir.display());
    println!("  Workers: {}", config.conversion.workers);
    println!("  Dry run: {}", config.conversion.dry_run);
    println!("  Stub unsupported: {}", config.conversion.stub_unsupported);
    if let Some(folder) = &config.conversion.scratch_folder {
        println!("  Scratch folder: {}", folder);
    }

    println!("\n✓ Configuration is valid (hash: {})", config_hash);

    Ok(())
}

/// Handles `discover`: seeds in, discovery inventory out
async fn handle_discover(
    config: &Config,
    input: &std::path::Path,
    output: &std::path::Path,
) -> anyhow::Result<()> {
    let seeds = read_seeds(input)
        .with_context(|| format!("Failed to read seeds from {}", input.display()))?;
    tracing::info!("Loaded {} seed URLs from {}", seeds.len(), input.display());

    let store = connect(config)?;
    let discoverer = Discoverer::new(store, config)?;
    let records = discoverer.discover(&seeds).await;

    write_discovery_records(output, &records)
        .with_context(|| format!("Failed to write inventory to {}", output.display()))?;
    tracing::info!("Wrote {} records to {}", records.len(), output.display());

    print_discovery_statistics(&DiscoveryStatistics::from_records(&records));
    Ok(())
}

/// Handles `convert`
async fn handle_convert(config: &Config, input: &std::path::Path) -> anyhow::Result<()> {
    let records = read_conversion_records(input)
        .with_context(|| format!("Failed to read inventory from {}", input.display()))?;
    tracing::info!("Loaded {} records from {}", records.len(), input.display());

    let store = connect(config)?;
    let converter = Converter::new(store, config)?;
    let report = converter.convert(&records).await;

    print_conversion_report(&report);
    report.ensure_success().map_err(|e| {
        tracing::error!("Conversion finished with failures: {}", e);
        e.into()
    })
}

/// Handles `sync`
async fn handle_sync(config: &Config, input: &std::path::Path) -> anyhow::Result<()> {
    let records = read_conversion_records(input)
        .with_context(|| format!("Failed to read inventory from {}", input.display()))?;

    let store = connect(config)?;
    let syncer = Syncer::new(store, config)?;
    let report = syncer.sync(&records).await?;

    print_sync_report(&report);
    report.ensure_success().map_err(|e| {
        tracing::error!("Sync finished with failures: {}", e);
        e.into()
    })
}
