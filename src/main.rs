//! Trawl command-line entry point

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use trawl::config::{load_config_with_hash, Config};
use trawl::{Browser, PhaseReport};

/// Trawl: browse a site, harvest its pages, extract records
///
/// Listing pages are walked breadth-first, pages worth keeping are archived
/// into compressed containers, and archived pages are turned into records
/// written to JSON lines, CSV or SQLite.
#[derive(Parser, Debug)]
#[command(name = "trawl")]
#[command(version)]
#[command(about = "A breadth-first crawl engine", long_about = None)]
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
    /// Walk listing pages and fill the harvest queue
    Browse {
        /// Start page, relative to the base URL (overrides `crawler.initial`)
        #[arg(long)]
        initial: Option<String>,
    },
    /// Download and archive every page in the harvest queue
    Harvest,
    /// Parse archived pages and write records to the sink
    Extract,
    /// Browse, harvest and extract in sequence
    Run {
        /// Start page, relative to the base URL (overrides `crawler.initial`)
        #[arg(long)]
        initial: Option<String>,
    },
    /// Validate the configuration and print it
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded (hash: {})", hash);

    if let Command::Check = cli.command {
        print_config(&config);
        return Ok(());
    }

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let mut browser = Browser::from_config(&config, cancel)?;

    let reports = match cli.command {
        Command::Browse { initial } => {
            let initial = initial.or_else(|| config.crawler.initial.clone());
            vec![browser.browse(initial.as_deref()).await?]
        }
        Command::Harvest => vec![browser.harvest().await?],
        Command::Extract => vec![browser.extract()?],
        Command::Run { initial } => {
            let initial = initial.or_else(|| config.crawler.initial.clone());
            browser.run(initial.as_deref()).await?
        }
        Command::Check => Vec::new(),
    };

    print_reports(&reports);
    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("trawl=info,warn"),
            1 => EnvFilter::new("trawl=debug,info"),
            2 => EnvFilter::new("trawl=trace,debug"),
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

/// Cancels `cancel` on the first Ctrl-C
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("Interrupted, finishing current item");
                cancel.cancel();
            }
            Err(e) => tracing::error!("Cannot listen for Ctrl-C: {}", e),
        }
    });
}

fn print_config(config: &Config) {
    println!("=== Trawl configuration ===\n");

    println!("Crawler:");
    println!("  Base URL: {}", config.crawler.base_url);
    println!(
        "  Initial: {}",
        config.crawler.initial.as_deref().unwrap_or("(base URL)")
    );

    println!("\nDownload:");
    println!("  User agent: {}", config.download.user_agent);
    println!("  Timeout: {}s", config.download.timeout_secs);
    println!(
        "  Retries: {} (factor {}, on {:?})",
        config.download.max_retries, config.download.backoff_factor, config.download.retry_on
    );
    println!("  Request delay: {}ms", config.download.request_delay_ms);
    println!("  Respect robots.txt: {}", !config.download.ignore_robots_txt);
    println!("  Proxies: {}", config.download.proxies.len());

    println!("\nBackoff:");
    println!(
        "  {}ms .. {}ms, give up after {} pauses",
        config.backoff.base_ms, config.backoff.max_ms, config.backoff.max_idle_pauses
    );

    println!("\nQueues: {:?} ({})", config.queue.backend, config.queue.path);
    println!(
        "Archive: {}/{}<n>.{} (max {} bytes)",
        config.archive.directory,
        config.archive.prefix,
        config.archive.extension,
        config.archive.max_size
    );

    println!("\nRules:");
    println!("  Browsable: {}", config.rules.browsable);
    println!("  Harvestable: {}", config.rules.harvestable);
    if let Some(stop) = &config.rules.stop {
        println!("  Stop: {}", stop);
    }
    for (field, selector) in &config.rules.fields {
        println!("  Field {}: {}", field, selector);
    }

    println!("\nSink: {:?} -> {}", config.sink.kind, config.sink.path);

    println!("\n✓ Configuration is valid");
}

fn print_reports(reports: &[PhaseReport]) {
    for report in reports {
        println!("{}", report);
    }
}
