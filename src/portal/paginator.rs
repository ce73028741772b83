//! Offset-driven walk over the listing pages, yielding one record per detail page

use std::collections::VecDeque;

use anyhow::Result;
use tracing::{debug, info};
use url::Url;

use super::detail::fetch_detail;
use super::listing::parse_listing;
use crate::models::{FieldMapping, TenderRecord};
use crate::session::listing_url;
use crate::traits::{PageFetcher, PortalLayout};

pub const DEFAULT_PAGE_ITEMS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageState {
    /// No listing page fetched yet
    Unstarted,
    /// Draining the detail links of the page at the current offset
    Open { is_last_page: bool },
    Finished,
}

/// Lazy sequence of tender records in page-then-row order.
///
/// Records are produced one at a time by [`TenderPaginator::next_record`]; a
/// listing page is only requested once the previous page's detail links are
/// exhausted. Any transport or structural error is returned as-is and the
/// sequence should be abandoned.
pub struct TenderPaginator<'a, F: PageFetcher + ?Sized> {
    fetcher: &'a F,
    base_url: Url,
    fields: &'a FieldMapping,
    layout: &'a PortalLayout,
    page_items: u32,
    offset: u32,
    pending: VecDeque<Url>,
    state: PageState,
}

impl<'a, F: PageFetcher + ?Sized> TenderPaginator<'a, F> {
    pub fn new(
        fetcher: &'a F,
        base_url: Url,
        fields: &'a FieldMapping,
        layout: &'a PortalLayout,
    ) -> Self {
        Self {
            fetcher,
            base_url,
            fields,
            layout,
            page_items: DEFAULT_PAGE_ITEMS,
            offset: 0,
            pending: VecDeque::new(),
            state: PageState::Unstarted,
        }
    }

    /// Listing offset of the first page to fetch.
    pub fn start_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Items per listing page; the offset advances by this much per page.
    pub fn page_items(mut self, page_items: u32) -> Self {
        self.page_items = page_items;
        self
    }

    /// Offset of the listing page currently being processed.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Produce the next record, or `None` once the last page is drained.
    pub async fn next_record(&mut self) -> Result<Option<TenderRecord>> {
        loop {
            if let Some(url) = self.pending.pop_front() {
                let record = fetch_detail(self.fetcher, &url, self.fields, self.layout).await?;
                return Ok(Some(record));
            }

            match self.state {
                PageState::Finished => return Ok(None),
                PageState::Open { is_last_page: true } => {
                    self.state = PageState::Finished;
                    return Ok(None);
                }
                PageState::Open {
                    is_last_page: false,
                } => {
                    self.offset += self.page_items;
                    self.load_page().await?;
                }
                PageState::Unstarted => self.load_page().await?,
            }
        }
    }

    /// Drain the remaining records into a vector.
    pub async fn collect_all(&mut self) -> Result<Vec<TenderRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record().await? {
            records.push(record);
        }
        Ok(records)
    }

    async fn load_page(&mut self) -> Result<()> {
        info!("Processing offset {}...", self.offset);

        let url = listing_url(&self.base_url, &self.layout.offset_param, self.offset);
        let page = self.fetcher.fetch(&url).await?;
        let listing = parse_listing(&page.body, &page.url, self.layout)?;

        debug!(
            "Offset {}: {} rows, last page: {}",
            self.offset,
            listing.detail_urls.len(),
            listing.is_last_page
        );

        self.pending = listing.detail_urls.into();
        self.state = PageState::Open {
            is_last_page: listing.is_last_page,
        };
        Ok(())
    }
}
