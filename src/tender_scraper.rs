use std::io::Write;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::cache::{CachedFetcher, ResponseCache};
use crate::config::ScrapeConfig;
use crate::output::JsonlWriter;
use crate::portal::TenderPaginator;
use crate::session::HttpSession;
use crate::traits::PageFetcher;

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub records: usize,
    /// Fields across all records that fell back to the sentinel
    pub scrape_errors: usize,
    pub last_offset: u32,
}

pub struct TenderScraper {
    fetcher: Box<dyn PageFetcher>,
    config: ScrapeConfig,
}

impl TenderScraper {
    pub async fn new(config: ScrapeConfig) -> Result<Self> {
        let session = HttpSession::from_bundle(config.ca_bundle.as_deref())?;

        let fetcher: Box<dyn PageFetcher> = if config.cache {
            let cache = ResponseCache::open(&config.cache_path()).await?;
            Box::new(CachedFetcher::new(session, cache))
        } else {
            Box::new(session)
        };

        Ok(Self::with_fetcher(config, fetcher))
    }

    pub fn with_fetcher(config: ScrapeConfig, fetcher: Box<dyn PageFetcher>) -> Self {
        Self { fetcher, config }
    }

    /// Scrape every listing page from the configured offset, writing each
    /// record as soon as it is extracted.
    pub async fn run<W: Write>(&self, out: &mut JsonlWriter<W>) -> Result<RunSummary> {
        let config = &self.config;
        info!(
            "Scraping {} from offset {} ({} items per page, {} fields)",
            config.url,
            config.start_offset,
            config.page_items,
            config.fields.len()
        );

        let mut pages = TenderPaginator::new(
            &*self.fetcher,
            config.url.clone(),
            &config.fields,
            &config.layout,
        )
        .start_offset(config.start_offset)
        .page_items(config.page_items);

        let mut records = 0;
        let mut scrape_errors = 0;

        loop {
            let mut record = match pages.next_record().await {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(e) => {
                    error!(
                        "Scrape failed at offset {} after {} records; rerun with --offset {} to resume",
                        pages.offset(),
                        records,
                        pages.offset()
                    );
                    return Err(e);
                }
            };

            let failed = record.unavailable_fields().count();
            if failed > 0 {
                warn!("Project {} has {} unavailable fields", record.id, failed);
            }
            scrape_errors += failed;

            record.source_agency = Some(config.source_agency.clone());
            out.write(&record)?;
            records += 1;
        }

        if records > 0 {
            info!("Scraped {} tenders", records);
        } else {
            info!("No tenders found");
        }

        Ok(RunSummary {
            records,
            scrape_errors,
            last_offset: pages.offset(),
        })
    }
}
