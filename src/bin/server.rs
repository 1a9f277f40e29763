//! group-cart HTTP server
//!
//! Serves `POST /scrape` and `GET /health` over a shared [`Scraper`].

use anyhow::Context;
use clap::Parser;
use group_cart::server::router;
use group_cart::{LogSink, ScrapeConfig, Scraper};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "group-cart-server")]
#[command(version)]
#[command(about = "Group order cart scraping service", long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8000")]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// JSON config file (timeouts, selectors, participant)
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Launch browsers in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Directory for failure snapshots
    #[arg(long, value_name = "DIR")]
    artifact_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ScrapeConfig::from_file(path)?,
        None => ScrapeConfig::default(),
    };
    if cli.headed {
        config.launch.headless = false;
    }

    log::info!("group-cart-server v{}", env!("CARGO_PKG_VERSION"));
    log::info!(
        "Browser mode: {}, up to {} concurrent session(s)",
        if config.launch.headless { "headless" } else { "headed" },
        config.max_sessions
    );

    let mut sink = LogSink::new();
    if let Some(dir) = &cli.artifact_dir {
        sink = sink.with_artifact_dir(dir);
    }
    let scraper = Scraper::new(config).with_sink(Arc::new(sink));
    let app = router(Arc::new(scraper));

    let bind_addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    log::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("Shutting down");
        })
        .await?;

    Ok(())
}
