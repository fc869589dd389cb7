//! Sumi-Sweep main entry point
//!
//! This is the command-line interface for the Sumi-Sweep broken-link sweeper.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use sumi_sweep::config::{load_config_with_hash, CrawlerSection, FileConfig};
use sumi_sweep::crawler::{crawl_with_progress, ConsoleProgress, HttpPageVisitor, NoOpProgress, ProgressReporter};
use sumi_sweep::report::{print_statistics, write_report};
use sumi_sweep::CrawlerOptions;
use tracing_subscriber::EnvFilter;

/// Exit code when the crawl found broken pages
const EXIT_BROKEN_PAGES: u8 = 1;

/// Exit code for configuration and internal errors
const EXIT_FAILURE: u8 = 2;

/// Sumi-Sweep: a concurrent broken-link sweeper
///
/// Sumi-Sweep crawls a website from a seed URL, follows same-origin links up
/// to a bounded depth, and reports broken pages and failed resources.
#[derive(Parser, Debug)]
#[command(name = "sumi-sweep")]
#[command(version)]
#[command(about = "A concurrent broken-link sweeper", long_about = None)]
struct Cli {
    /// Seed URL (overrides crawler.url from the config file)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Maximum link depth from the seed (default: unbounded)
    #[arg(short, long)]
    depth: Option<u32>,

    /// Exclusion pattern, glob or substring (repeatable)
    #[arg(short = 'e', long = "exclude", value_name = "PATTERN")]
    exclusions: Vec<String>,

    /// Per-page timeout in milliseconds
    #[arg(short, long = "timeout", value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Maximum number of concurrent page visits
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Extra attempts for pages failing with retryable errors
    #[arg(long)]
    retries: Option<u32>,

    /// Failed-resource pattern to report without failing the crawl (repeatable)
    #[arg(long, value_name = "PATTERN")]
    ignore: Vec<String>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the report here (.json for JSON, markdown otherwise)
    #[arg(short, long, value_name = "REPORT")]
    output: Option<PathBuf>,

    /// Do not probe images, scripts, and stylesheets
    #[arg(long)]
    no_resources: bool,

    /// Suppress progress output and statistics
    #[arg(short, long)]
    silent: bool,

    /// Validate options and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_BROKEN_PAGES),
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_FAILURE)
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
            0 => EnvFilter::new("sumi_sweep=info,warn"),
            1 => EnvFilter::new("sumi_sweep=debug,info"),
            2 => EnvFilter::new("sumi_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs the crawl; `Ok(true)` means no page was broken
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let (file_config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (FileConfig::default(), None),
    };

    let report_path = cli.output.clone().or(file_config.report.path.clone());
    let check_resources = !cli.no_resources;
    let dry_run = cli.dry_run;
    let options = merge_options(cli, file_config.crawler).context("Invalid crawl options")?;

    if dry_run {
        handle_dry_run(&options, report_path.as_deref());
        return Ok(true);
    }

    let visitor = HttpPageVisitor::new()
        .context("Failed to build HTTP client")?
        .with_resource_checks(check_resources);

    let progress: Box<dyn ProgressReporter> = if options.silent {
        Box::new(NoOpProgress)
    } else {
        Box::new(ConsoleProgress::new())
    };
    let silent = options.silent;

    let mut outcome = crawl_with_progress(options, visitor, progress.as_ref())
        .await
        .context("Crawl aborted")?;
    if let Some(hash) = config_hash {
        outcome = outcome.with_config_hash(hash);
    }

    if !silent {
        println!();
        print_statistics(&outcome.stats);
        println!();
        if outcome.is_success() {
            println!("No broken pages found.");
        } else {
            println!("Broken pages ({}):", outcome.errors.pages.len());
            for page in &outcome.errors.pages {
                println!("  {}", page);
                for error in outcome.errors.errors_for(page) {
                    println!("    {}", error);
                }
            }
        }
    }

    if let Some(path) = report_path {
        write_report(&outcome, &path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    Ok(outcome.is_success())
}

/// Applies command-line flags on top of the `[crawler]` table
fn merge_options(cli: Cli, mut section: CrawlerSection) -> anyhow::Result<CrawlerOptions> {
    if let Some(url) = cli.url {
        section.url = Some(url);
    }
    if section.url.is_none() {
        anyhow::bail!("A seed URL is required (pass URL or set crawler.url in --config)");
    }
    if cli.depth.is_some() {
        section.depth = cli.depth;
    }
    if cli.timeout_ms.is_some() {
        section.timeout_ms = cli.timeout_ms;
    }
    if cli.concurrency.is_some() {
        section.concurrency = cli.concurrency;
    }
    if cli.retries.is_some() {
        section.retries = cli.retries;
    }
    section.exclusions.extend(cli.exclusions);
    section.ignore.extend(cli.ignore);
    section.silent |= cli.silent;

    Ok(section.into_options()?)
}

/// Handles the --dry-run mode: shows the effective options
fn handle_dry_run(options: &CrawlerOptions, report_path: Option<&std::path::Path>) {
    println!("=== Sumi-Sweep Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed: {}", options.url);
    println!("  Depth: {}", options.depth);
    println!("  Timeout: {}ms", options.timeout.as_millis());
    println!("  Concurrency: {}", options.concurrency);
    println!("  Retries: {}", options.retries);

    println!("\nExclusions ({}):", options.exclusions.len());
    for pattern in &options.exclusions {
        println!("  - {}", pattern);
    }

    println!("\nIgnored Resources ({}):", options.ignore.len());
    for pattern in &options.ignore {
        println!("  - {}", pattern);
    }

    println!("\nReport:");
    match report_path {
        Some(path) => println!("  {}", path.display()),
        None => println!("  (none)"),
    }

    println!("\n✓ Configuration is valid");
}
