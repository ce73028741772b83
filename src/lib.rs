//! Paginated scraper for a government tender portal.
//!
//! Walks the listing pages, follows every row to its detail page and pulls a
//! configured set of fields out of the detail tables by position, producing
//! one [`models::TenderRecord`] per tender.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod portal;
pub mod session;
pub mod tender_scraper;
pub mod traits;

pub use error::ScrapeError;
pub use models::{FieldMapping, FieldPosition, FieldValue, SCRAPE_ERROR, TenderRecord};
pub use portal::TenderPaginator;
pub use tender_scraper::{RunSummary, TenderScraper};
pub use traits::{FetchedPage, PageFetcher, PortalLayout};
