//! Tender portal scraping: listing pagination, detail discovery and field extraction

pub mod detail;
pub mod listing;
pub mod paginator;

use scraper::Selector;

use crate::error::ScrapeError;

pub use detail::{extract_record, extract_tables, fetch_detail, project_number};
pub use listing::{ListingPage, parse_listing};
pub use paginator::TenderPaginator;

pub(crate) fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}
