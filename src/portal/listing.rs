//! Listing page parsing: detail links and end-of-pagination detection

use anyhow::Result;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::parse_selector;
use crate::error::ScrapeError;
use crate::traits::PortalLayout;

/// What one listing page yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// Absolute detail URLs, in row order
    pub detail_urls: Vec<Url>,
    /// No further listing pages follow this one
    pub is_last_page: bool,
}

/// Parse a listing page fetched from `page_url` (its final, post-redirect URL).
pub fn parse_listing(html: &str, page_url: &Url, layout: &PortalLayout) -> Result<ListingPage> {
    let table_selector = parse_selector(&layout.listing_table_selector())?;
    let footer_selector = parse_selector("tfoot")?;
    let link_selector = parse_selector("a")?;

    let document = Html::parse_document(html);

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| ScrapeError::MissingTable {
            class: layout.listing_table_class.clone(),
            url: page_url.to_string(),
        })?;

    let footer = table
        .select(&footer_selector)
        .next()
        .ok_or_else(|| ScrapeError::MissingFooter {
            url: page_url.to_string(),
        })?;
    let is_last_page = !footer
        .text()
        .any(|text| text.contains(layout.last_page_marker.as_str()));

    let detail_urls = table_rows(table)
        .into_iter()
        .enumerate()
        .skip(1)
        .map(|(index, row)| detail_link(row, index, page_url, &link_selector))
        .collect::<Result<Vec<_>>>()?;

    Ok(ListingPage {
        detail_urls,
        is_last_page,
    })
}

/// Rows that belong to the table itself: `tr` children of the table or of a
/// `thead`/`tbody` directly under it. Footer rows and rows of nested tables
/// are left out.
fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();

    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" => rows.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| el.value().name() == "tr"),
            ),
            _ => {}
        }
    }

    rows
}

fn detail_link(row: ElementRef<'_>, index: usize, page_url: &Url, links: &Selector) -> Result<Url> {
    let href = row
        .select(links)
        .next()
        .and_then(|a| a.value().attr("href"))
        .ok_or_else(|| ScrapeError::MissingDetailLink {
            row: index,
            url: page_url.to_string(),
        })?;

    page_url.join(href.trim()).map_err(|source| {
        ScrapeError::InvalidDetailLink {
            href: href.to_string(),
            base: page_url.to_string(),
            source,
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://portal.example/tender/senarai.php?offset=20").unwrap()
    }

    fn listing(rows: &[&str], footer: &str) -> String {
        let body: String = rows
            .iter()
            .map(|href| format!(r#"<tr><td><a href="{href}">Tender</a></td><td>Open</td></tr>"#))
            .collect();
        format!(
            r#"<html><body>
            <table class="mt1">
              <tr><th>No.</th><th>Status</th></tr>
              {body}
              <tfoot><tr><td>{footer}</td></tr></tfoot>
            </table>
            </body></html>"#
        )
    }

    #[test]
    fn skips_header_and_resolves_links() {
        let html = listing(
            &["papar.php?No_Proj=1", "/tender/papar.php?No_Proj=2", "https://other.example/x?No_Proj=3"],
            "Page 2 <a href='?offset=40'>Next</a> <a href='?offset=980'>Last</a>",
        );

        let page = parse_listing(&html, &page_url(), &PortalLayout::default()).unwrap();

        let urls: Vec<_> = page.detail_urls.iter().map(Url::as_str).collect();
        assert_eq!(
            urls,
            [
                "https://portal.example/tender/papar.php?No_Proj=1",
                "https://portal.example/tender/papar.php?No_Proj=2",
                "https://other.example/x?No_Proj=3",
            ]
        );
        assert!(!page.is_last_page);
    }

    #[test]
    fn footer_without_marker_is_last_page() {
        let html = listing(&["papar.php?No_Proj=1"], "<a href='?offset=0'>First</a> Page 50");

        let page = parse_listing(&html, &page_url(), &PortalLayout::default()).unwrap();

        assert!(page.is_last_page);
        assert_eq!(page.detail_urls.len(), 1);
    }

    #[test]
    fn marker_match_is_case_sensitive() {
        let html = listing(&["papar.php?No_Proj=1"], "last");
        let page = parse_listing(&html, &page_url(), &PortalLayout::default()).unwrap();
        assert!(page.is_last_page);
    }

    #[test]
    fn marker_outside_footer_is_ignored() {
        let html = listing(&["papar.php?No_Proj=Last"], "Page 3");
        let page = parse_listing(&html, &page_url(), &PortalLayout::default()).unwrap();
        assert!(page.is_last_page);
    }

    #[test]
    fn header_only_table_has_no_rows() {
        let html = listing(&[], "Page 1");
        let page = parse_listing(&html, &page_url(), &PortalLayout::default()).unwrap();
        assert!(page.detail_urls.is_empty());
    }

    #[test]
    fn nested_table_rows_are_not_listing_rows() {
        let html = r#"<table class="mt1">
            <tbody>
              <tr><th>No.</th></tr>
              <tr><td><a href="papar.php?No_Proj=1">A</a>
                <table><tr><td><a href="nested.php">n</a></td></tr></table>
              </td></tr>
            </tbody>
            <tfoot><tr><td>Last</td></tr></tfoot>
        </table>"#;

        let page = parse_listing(html, &page_url(), &PortalLayout::default()).unwrap();

        assert_eq!(page.detail_urls.len(), 1);
        assert!(page.detail_urls[0].as_str().ends_with("papar.php?No_Proj=1"));
        assert!(!page.is_last_page);
    }

    #[test]
    fn missing_table_is_structural_error() {
        let err = parse_listing("<table class='mt2'></table>", &page_url(), &PortalLayout::default())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScrapeError>(),
            Some(ScrapeError::MissingTable { .. })
        ));
    }

    #[test]
    fn missing_footer_is_structural_error() {
        let html = r#"<table class="mt1"><tr><th>No.</th></tr></table>"#;
        let err = parse_listing(html, &page_url(), &PortalLayout::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScrapeError>(),
            Some(ScrapeError::MissingFooter { .. })
        ));
    }

    #[test]
    fn row_without_link_is_structural_error() {
        let html = r#"<table class="mt1">
            <tr><th>No.</th></tr>
            <tr><td>no link here</td></tr>
            <tfoot><tr><td></td></tr></tfoot>
        </table>"#;
        let err = parse_listing(html, &page_url(), &PortalLayout::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScrapeError>(),
            Some(ScrapeError::MissingDetailLink { row: 1, .. })
        ));
    }
}
