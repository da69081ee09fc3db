//! page-harvest main entry point
//!
//! This is the command-line interface for the page-harvest crawler.

use anyhow::Context;
use clap::Parser;
use page_harvest::config::{load_config_with_hash, Config};
use page_harvest::crawler::Coordinator;
use page_harvest::output::{print_statistics, truncate_output, EmissionLedger};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tracing_subscriber::EnvFilter;

/// page-harvest: crawl informational sites into retrieval-ready chunks
///
/// page-harvest walks the configured sites depth-first, keeps pages in supported
/// languages, extracts their text, translates it to English and appends overlapping
/// chunks as JSON lines.
#[derive(Parser, Debug)]
#[command(name = "page-harvest")]
#[command(version)]
#[command(about = "Crawl sites into chunked JSON-lines records", long_about = None)]
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

    /// Truncate the records file before crawling
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Extract the URLs listed in FILE (one per line) instead of crawling the sites
    #[arg(long, value_name = "FILE")]
    url_list: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
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
        return handle_dry_run(&config);
    }

    handle_crawl(config, config_hash, cli.fresh, cli.url_list.as_deref()).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_harvest=info,warn"),
            1 => EnvFilter::new("page_harvest=debug,info"),
            2 => EnvFilter::new("page_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== page-harvest Dry Run ===\n");

    println!("Crawler:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Politeness jitter: 0-{}ms", config.crawler.politeness_jitter_ms);
    println!("  User agent: {}", config.http.user_agent);
    println!("  Retries: {}", config.http.max_retries);

    println!("\nPipeline:");
    if config.language.supported.is_empty() {
        println!("  Languages: any");
    } else {
        println!("  Languages: {}", config.language.supported.join(", "));
    }
    println!("  Extracted tags: {}", config.extract.tags.join(", "));
    println!(
        "  Chunks: {} chars, {} overlap ({:?})",
        config.chunk.size, config.chunk.overlap, config.chunk.policy
    );
    match (config.translate.enabled, &config.translate.endpoint) {
        (true, Some(endpoint)) => println!("  Translation: {}", endpoint),
        _ => println!("  Translation: disabled"),
    }

    println!("\nOutput:");
    println!("  Records: {}", config.output.records_path);
    if let Some(path) = &config.output.visited_path {
        println!("  Visited URLs: {}", path);
    }
    if let Some(path) = &config.output.ledger_path {
        println!("  Ledger: {}", path);
        print_ledger_summary(Path::new(path))?;
    }

    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        for seed in &site.seeds {
            println!("  * {}", seed);
        }
        for prefix in &site.exclude_urls {
            println!("    excluding {}", prefix);
        }
    }

    println!("\nFeeds ({}):", config.feeds.len());
    for feed in &config.feeds {
        println!("  * {}", feed.url_template);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs and {} feeds",
        config.seed_count(),
        config.feeds.len()
    );

    Ok(())
}

/// Prints what an existing ledger already holds
fn print_ledger_summary(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        println!("    (not created yet)");
        return Ok(());
    }

    let ledger = EmissionLedger::open(path)
        .with_context(|| format!("failed to open ledger {}", path.display()))?;
    println!("    Pages already emitted: {}", ledger.count_emitted()?);
    if let Some(run) = ledger.latest_run()? {
        println!(
            "    Last run #{} ({}): {} pages, {} chunks, started {}",
            run.id,
            run.status.to_db_string(),
            run.pages_persisted,
            run.chunks_written,
            run.started_at
        );
    }
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: String,
    fresh: bool,
    url_list: Option<&Path>,
) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Truncating {}", config.output.records_path);
        truncate_output(Path::new(&config.output.records_path))
            .with_context(|| format!("failed to truncate {}", config.output.records_path))?;
    }

    let mut coordinator = Coordinator::new(config)?.with_config_hash(config_hash);

    let shutdown = coordinator.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            shutdown.store(true, Ordering::SeqCst);
        }
    });

    let result = match url_list {
        Some(path) => {
            tracing::info!("Extracting URLs listed in {}", path.display());
            coordinator.extract_url_list(path).await
        }
        None => coordinator.run().await,
    };

    match result {
        Ok(stats) => {
            print_statistics(&stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
