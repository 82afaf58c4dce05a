//! Paper-Tide main entry point
//!
//! This is the command-line interface for the Paper-Tide paper harvester.

use clap::Parser;
use paper_tide::config::load_config_with_hash;
use paper_tide::harvester::{run_ingest, RunSummary, SourceOutcome};
use paper_tide::store::{PaperStore, SqliteStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Paper-Tide: a polite multi-source paper harvester
///
/// Paper-Tide fetches advance-article listings from configured publisher
/// sources, normalizes them into one canonical shape, and merges them into
/// a local database exactly once per logical record.
#[derive(Parser, Debug)]
#[command(name = "paper-tide")]
#[command(version = "1.0.0")]
#[command(about = "A polite multi-source paper harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be ingested without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show per-source statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    if cli.stats {
        handle_stats(&config)?;
        return Ok(());
    }

    let exit_code = handle_ingest(&config).await?;
    std::process::exit(exit_code);
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("paper_tide=info,warn"),
            1 => EnvFilter::new("paper_tide=debug,info"),
            2 => EnvFilter::new("paper_tide=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows the source table
fn handle_dry_run(config: &paper_tide::Config) {
    println!("=== Paper-Tide Dry Run ===\n");

    println!("Ingestion:");
    println!(
        "  Max concurrent sources: {}",
        config.ingest.max_concurrent_sources
    );
    println!("  Request delay: {}ms", config.ingest.request_delay_ms);
    println!(
        "  Retries: {} (backoff {}ms)",
        config.ingest.max_retries, config.ingest.retry_backoff_ms
    );
    println!("  Source timeout: {}s", config.ingest.source_timeout_secs);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nSources ({}):", config.sources.len());
    for source in &config.sources {
        println!("  - {} ({})", source.id, source.name);
        println!("    List URL: {}", source.list_url);
        match &source.page_param {
            Some(param) => println!("    Pagination: {} (up to {} pages)", param, source.max_pages),
            None => println!("    Pagination: single page"),
        }
        println!("    Strategies: {}", source.strategies.len());
        match &source.feed_url {
            Some(url) => println!("    Feed fallback: {}", url),
            None => println!("    Feed fallback: none"),
        }
    }

    println!("\nTopics ({}):", config.topics.len());
    for topic in &config.topics {
        println!("  - {} ({} keywords)", topic.name, topic.keywords.len());
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows per-source statistics from the database
fn handle_stats(config: &paper_tide::Config) -> anyhow::Result<()> {
    let store = SqliteStore::new(std::path::Path::new(&config.output.database_path))?;

    println!("Database: {}\n", config.output.database_path);
    println!("Total papers: {}\n", store.count_all()?);

    for source in &config.sources {
        println!("{} ({})", source.id, source.name);
        println!("  Papers: {}", store.count_papers(&source.id)?);
        match store.sync_state(&source.id)? {
            Some(state) => {
                println!("  Last run: {}", state.last_run_at.to_rfc3339());
                println!(
                    "  Last method: {} ({} records)",
                    state.method, state.batch_size
                );
            }
            None => println!("  Last run: never"),
        }
        println!();
    }

    Ok(())
}

/// Handles the default mode: ingest all configured sources now
async fn handle_ingest(config: &paper_tide::Config) -> anyhow::Result<i32> {
    let store: Arc<dyn PaperStore> = Arc::new(SqliteStore::new(std::path::Path::new(
        &config.output.database_path,
    ))?);

    let summary = run_ingest(config, store).await;
    print_summary(&summary);

    Ok(summary.exit_code())
}

/// Prints the per-source run summary
fn print_summary(summary: &RunSummary) {
    println!("\n=== Ingestion Summary ===\n");

    for report in &summary.reports {
        match &report.outcome {
            SourceOutcome::Ingested {
                method,
                records,
                inserted,
                skipped,
                parse_errors,
                warnings,
            } => {
                println!(
                    "✓ {}: method={} records={} inserted={} skipped={}",
                    report.source, method, records, inserted, skipped
                );
                if *parse_errors > 0 {
                    println!("    {} item(s) dropped for missing titles", parse_errors);
                }
                for warning in warnings {
                    println!("    warning: {}", warning);
                }
            }
            SourceOutcome::Failed { error } => {
                println!("✗ {}: FAILED (stale data retained): {}", report.source, error);
            }
        }
    }

    println!(
        "\n{} succeeded, {} failed, {} new papers",
        summary.succeeded(),
        summary.failed(),
        summary.total_inserted()
    );
}
