//! Traits and layout description shared by the portal pipeline

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

/// A fetched HTML page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects; relative links on the page resolve against it.
    pub url: Url,
    /// HTTP status of the final response
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Source of HTML pages for the scraper.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a page with a single GET request
    ///
    /// # Arguments
    /// * `url` - Absolute URL to request
    ///
    /// # Returns
    /// * `Result<FetchedPage>` - The page body and its resolved URL, or a transport error
    async fn fetch(&self, url: &Url) -> Result<FetchedPage>;
}

/// Structural markers of the tender portal's HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalLayout {
    /// CSS class of the listing results table
    pub listing_table_class: String,
    /// CSS class of the detail page's field tables
    pub detail_table_class: String,
    /// Footer text present on every page but the last
    pub last_page_marker: String,
    /// Detail URL query parameter holding the project number
    pub project_param: String,
    /// Listing URL query parameter carrying the pagination offset
    pub offset_param: String,
}

impl Default for PortalLayout {
    fn default() -> Self {
        Self {
            listing_table_class: "mt1".to_string(),
            detail_table_class: "mt2".to_string(),
            last_page_marker: "Last".to_string(),
            project_param: "No_Proj".to_string(),
            offset_param: "offset".to_string(),
        }
    }
}

impl PortalLayout {
    pub fn listing_table_selector(&self) -> String {
        format!(".{}", self.listing_table_class)
    }

    pub fn detail_table_selector(&self) -> String {
        format!(".{}", self.detail_table_class)
    }
}
