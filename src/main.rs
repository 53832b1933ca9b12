// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (-v = debug, otherwise warnings only; RUST_LOG overrides)
// 3. Build the Strategy and the Scheduler, then crawl
// 4. Print the report and exit (0 = crawl finished, 2 = error)
//
// Pressing Ctrl-C doesn't kill the process outright: it asks the crawl to
// stop, waits for in-flight fetches, and still prints what was found.
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use link_spider::{CrawlReport, Scheduler, StopReason};
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::Cli;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let strategy = cli.to_strategy().context("invalid crawl settings")?;
    let mut spider = Scheduler::with_http(strategy).context("failed to set up the crawler")?;
    spider
        .set_root(&cli.root_url)
        .with_context(|| format!("cannot crawl '{}'", cli.root_url))?;
    debug!(strategy = ?spider.strategy(), "crawl settings");

    let stop = spider.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, waiting for running fetches to finish");
            stop.request(StopReason::Interrupted);
        }
    });

    let report = spider.run().await?;
    print_report(&report, cli.json)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        println!("{}", json_output);
        return Ok(());
    }

    println!("{:<8} {}", "DEPTH", "URL");
    println!("{}", "=".repeat(72));
    for record in &report.urls {
        println!("{:<8} {}", record.depth(), record.url());
    }
    println!();

    println!("Summary:");
    println!("   Root: {}", report.root);
    println!("   Visited: {}", report.visited);
    println!("   Stopped: {}", report.reason);
    println!("   Elapsed: {:.1?}", report.elapsed());
    Ok(())
}
