//! group-cart command line
//!
//! Scrapes one group-order URL and prints the cart as JSON on stdout.
//! Progress and diagnostics go to stderr through `RUST_LOG`.

use anyhow::Context;
use clap::Parser;
use group_cart::{LogSink, ParticipantSelector, ScrapeConfig, Scraper};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "group-cart")]
#[command(version)]
#[command(about = "Extract the cart of a shared group food order", long_about = None)]
struct Cli {
    /// Group order URL
    url: String,

    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    chrome_path: Option<PathBuf>,

    /// JSON config file (timeouts, selectors, participant)
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Zero-based position of the participant to extract
    #[arg(long, value_name = "N", conflicts_with = "participant_name")]
    participant_index: Option<usize>,

    /// Extract the first participant whose name contains this text
    #[arg(long, value_name = "NAME")]
    participant_name: Option<String>,

    /// Directory for failure snapshots (<stage>.html, <stage>.png)
    #[arg(long, value_name = "DIR")]
    artifact_dir: Option<PathBuf>,

    /// Overall deadline for the scrape, in seconds
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Print only `[{name, price}]`
    #[arg(long)]
    items_only: bool,
}

#[derive(Serialize)]
struct ItemSummary<'a> {
    name: &'a str,
    price: f64,
}

fn build_config(cli: &Cli) -> anyhow::Result<ScrapeConfig> {
    let mut config = match &cli.config {
        Some(path) => ScrapeConfig::from_file(path)?,
        None => ScrapeConfig::default(),
    };

    if cli.headed {
        config.launch.headless = false;
    }
    if let Some(path) = &cli.chrome_path {
        config.launch.chrome_path = Some(path.clone());
    }
    if let Some(index) = cli.participant_index {
        config.participant = ParticipantSelector::Position(index);
    }
    if let Some(name) = &cli.participant_name {
        config.participant = ParticipantSelector::Name(name.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    log::info!(
        "Browser mode: {}",
        if config.launch.headless { "headless" } else { "headed" }
    );

    let mut sink = LogSink::new();
    if let Some(dir) = &cli.artifact_dir {
        sink = sink.with_artifact_dir(dir);
    }
    let scraper = Scraper::new(config).with_sink(Arc::new(sink));

    let cart = match cli.timeout_secs {
        Some(secs) => scraper.scrape_with_deadline(&cli.url, Duration::from_secs(secs)).await,
        None => scraper.scrape(&cli.url).await,
    }
    .with_context(|| format!("Failed to scrape {}", cli.url))?;

    let output = if cli.items_only {
        let items: Vec<ItemSummary> = cart
            .items()
            .iter()
            .map(|item| ItemSummary {
                name: item.name(),
                price: item.price().as_f64(),
            })
            .collect();
        serde_json::to_string_pretty(&items)?
    } else {
        serde_json::to_string_pretty(&cart)?
    };
    println!("{}", output);

    Ok(())
}
