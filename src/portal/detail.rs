//! Detail page extraction by (table, cell) position

use anyhow::Result;
use scraper::Html;
use tracing::{info, warn};
use url::Url;

use super::parse_selector;
use crate::error::ScrapeError;
use crate::models::{FieldMapping, FieldValue, TenderRecord};
use crate::traits::{PageFetcher, PortalLayout};

/// Project number carried in the detail URL's query string.
pub fn project_number(url: &Url, layout: &PortalLayout) -> Result<String> {
    url.query_pairs()
        .find(|(key, _)| key == layout.project_param.as_str())
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| {
            ScrapeError::MissingProjectNumber {
                url: url.to_string(),
                param: layout.project_param.clone(),
            }
            .into()
        })
}

/// Flatten every detail table into its ordered, trimmed `td` texts.
pub fn extract_tables(html: &str, layout: &PortalLayout) -> Result<Vec<Vec<String>>> {
    let table_selector = parse_selector(&layout.detail_table_selector())?;
    let cell_selector = parse_selector("td")?;

    let document = Html::parse_document(html);

    let tables = document
        .select(&table_selector)
        .map(|table| {
            table
                .select(&cell_selector)
                .map(|td| td.text().collect::<String>().trim().to_string())
                .collect()
        })
        .collect();

    Ok(tables)
}

/// Build a record from a detail page. Positions missing from the page become
/// [`FieldValue::Unavailable`]; `source_agency` is left for the caller.
pub fn extract_record(
    html: &str,
    url: &Url,
    fields: &FieldMapping,
    layout: &PortalLayout,
) -> Result<TenderRecord> {
    let id = project_number(url, layout)?;
    let tables = extract_tables(html, layout)?;

    let fields = fields
        .iter()
        .map(|spec| {
            let cell = tables
                .get(spec.position.table())
                .and_then(|cells| cells.get(spec.position.cell()));

            let value = match cell {
                Some(text) => FieldValue::Text(text.clone()),
                None => {
                    warn!(
                        "Project {}: no cell {} in table {} for field '{}' ({} tables found)",
                        id,
                        spec.position.cell(),
                        spec.position.table(),
                        spec.name,
                        tables.len()
                    );
                    FieldValue::Unavailable
                }
            };

            (spec.name.clone(), value)
        })
        .collect();

    Ok(TenderRecord {
        id,
        fields,
        source_url: url.to_string(),
        source_agency: None,
    })
}

/// Fetch one detail page and extract its record.
pub async fn fetch_detail<F: PageFetcher + ?Sized>(
    fetcher: &F,
    url: &Url,
    fields: &FieldMapping,
    layout: &PortalLayout,
) -> Result<TenderRecord> {
    let project = project_number(url, layout)?;
    info!("Processing project {}...", project);

    let page = fetcher.fetch(url).await?;
    extract_record(&page.body, url, fields, layout)
}
