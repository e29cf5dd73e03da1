//! Price-Watch main entry point
//!
//! This is the command-line interface for the spreadsheet-driven price monitor.

use anyhow::Context;
use clap::Parser;
use price_watch::config::{load_config_with_hash, validate, Config, WorkbookBackend};
use price_watch::job::{print_fetch_report, print_report, JobRunner};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Price-Watch: a spreadsheet-driven price monitor
///
/// Price-Watch reads product URLs from a workbook, fetches each price
/// through a rotating pool of scraping providers, and appends timestamped
/// results to a log sheet.
#[derive(Parser, Debug)]
#[command(name = "price-watch")]
#[command(version = "1.0.0")]
#[command(about = "A spreadsheet-driven price monitor", long_about = None)]
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

    /// Validate config and show what would run without fetching anything
    #[arg(long, conflicts_with_all = ["check_url", "add_url"])]
    dry_run: bool,

    /// Fetch the price of one URL and print it, without logging
    #[arg(long, value_name = "URL", conflicts_with_all = ["dry_run", "add_url"])]
    check_url: Option<String>,

    /// Append URLs to the input sheet and exit
    #[arg(long, value_name = "URL", num_args = 1.., conflicts_with_all = ["dry_run", "check_url"])]
    add_url: Vec<String>,

    /// Override the number of concurrent fetch workers
    #[arg(long, value_name = "N")]
    workers: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if let Some(workers) = cli.workers {
        config.job.workers = workers;
        validate(&config).context("invalid --workers")?;
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else if let Some(url) = &cli.check_url {
        handle_check_url(&config, url).await?;
    } else if !cli.add_url.is_empty() {
        handle_add_urls(&config, &cli.add_url).await?;
    } else {
        handle_run(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("price_watch=info,warn"),
            1 => EnvFilter::new("price_watch=debug,info"),
            2 => EnvFilter::new("price_watch=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Price-Watch Dry Run ===\n");

    let job = &config.job;
    println!("Job Configuration:");
    println!("  Attempts per URL: {}", job.attempts);
    println!("  Retry delay: {}ms", job.retry_delay_ms);
    println!("  Workers: {}", job.workers);
    println!("  Dispatch delay: {}ms", job.dispatch_delay_ms);
    println!(
        "  Log append: {} attempts, {}ms apart",
        job.append_attempts, job.append_delay_ms
    );
    println!("  Request timeout: {}s", job.request_timeout_secs);
    println!(
        "  Timestamps: {}",
        job.timezone.as_deref().unwrap_or("local time")
    );

    let workbook = &config.workbook;
    println!("\nWorkbook:");
    match workbook.backend {
        WorkbookBackend::Sqlite => println!(
            "  SQLite: {}",
            workbook.database_path.as_deref().unwrap_or_default()
        ),
        WorkbookBackend::GoogleSheets => println!(
            "  Google Sheets: {}",
            workbook.spreadsheet_id.as_deref().unwrap_or_default()
        ),
    }
    println!("  Input sheet: {}", workbook.input_sheet);
    println!("  Log sheet: {}", workbook.log_sheet);

    println!(
        "\nPricing API: {}",
        match &config.pricing {
            Some(pricing) => format!("enabled (geo-location {})", pricing.geo_location),
            None => "disabled".to_string(),
        }
    );

    println!("\nProviders ({}):", config.providers.len());
    for (id, entry) in config.providers.iter().enumerate() {
        println!(
            "  #{} {} (quota {}, reset to {}) via {}",
            id,
            entry.kind,
            entry.initial_quota(),
            entry.reset_quota(),
            entry.base_url()
        );
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --check-url mode: fetches one price and prints it
async fn handle_check_url(config: &Config, url: &str) -> anyhow::Result<()> {
    let runner = JobRunner::from_config(config).context("failed to set up job")?;

    let report = runner.check(url).await;
    print_fetch_report(&report, &runner.rotation().snapshot());

    Ok(())
}

/// Handles the --add-url mode: appends URLs to the input sheet
async fn handle_add_urls(config: &Config, urls: &[String]) -> anyhow::Result<()> {
    let runner = JobRunner::from_config(config).context("failed to set up job")?;

    let added = runner
        .add_urls(urls)
        .await
        .context("failed to add URLs to the input sheet")?;
    println!(
        "✓ Added {} URL(s) to '{}'",
        added, config.workbook.input_sheet
    );

    Ok(())
}

/// Handles the main job run
async fn handle_run(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        "Providers: {}, pricing API: {}",
        config.providers.len(),
        if config.pricing.is_some() { "on" } else { "off" }
    );

    let runner = JobRunner::from_config(config).context("failed to set up job")?;

    match runner.run().await {
        Ok(report) => {
            print_report(&report);
            if !report.is_empty() && !report.logged {
                tracing::error!("Results were not written to the log sheet");
            }
            tracing::info!("Job completed");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Job failed: {}", e);
            Err(e.into())
        }
    }
}
