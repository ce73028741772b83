use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tender_scraper::config::ScrapeConfig;
use tender_scraper::output::JsonlWriter;
use tender_scraper::TenderScraper;

/// Scrape tender listings into a JSON Lines file
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// JSON scrape configuration
    config: PathBuf,

    /// Listing offset to start from (overrides `start_offset`)
    #[arg(long)]
    offset: Option<u32>,

    /// Items per listing page (overrides `page_items`)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    page_items: Option<u32>,

    /// Output file (defaults to `<project_name>.jsonl`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Always hit the network instead of the response cache
    #[arg(long)]
    no_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let mut config = ScrapeConfig::load(&cli.config)?;
    if let Some(offset) = cli.offset {
        config.start_offset = offset;
    }
    if let Some(page_items) = cli.page_items {
        config.page_items = page_items;
    }
    if cli.no_cache {
        config.cache = false;
    }

    let output_path = cli.output.unwrap_or_else(|| config.output_path());
    info!("Writing tenders to {}", output_path.display());

    let scraper = TenderScraper::new(config).await?;
    let mut out = JsonlWriter::create(&output_path)?;
    let summary = scraper.run(&mut out).await;
    out.finish()?;
    let summary = summary?;

    info!(
        "Done: {} records, {} unavailable fields, stopped at offset {}",
        summary.records, summary.scrape_errors, summary.last_offset
    );
    Ok(())
}
