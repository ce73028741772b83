//! Scrape job configuration, loaded from a JSON file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use url::Url;

use crate::models::{FieldMapping, RESERVED_KEYS};
use crate::portal::paginator::DEFAULT_PAGE_ITEMS;
use crate::traits::PortalLayout;

#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeConfig {
    /// Names the output (`<project_name>.jsonl`) and cache (`<project_name>.sqlite`) files
    pub project_name: String,
    /// Listing page URL, without the offset parameter
    pub url: Url,
    /// Written into every record as `source_agency`
    pub source_agency: String,
    pub fields: FieldMapping,

    #[serde(default)]
    pub start_offset: u32,

    #[serde(default = "default_page_items")]
    pub page_items: u32,

    /// PEM bundle TLS verification is pinned to; `null` uses the platform roots
    #[serde(default = "default_ca_bundle")]
    pub ca_bundle: Option<PathBuf>,

    #[serde(default = "default_cache")]
    pub cache: bool,

    #[serde(default)]
    pub layout: PortalLayout,
}

fn default_page_items() -> u32 {
    DEFAULT_PAGE_ITEMS
}

fn default_ca_bundle() -> Option<PathBuf> {
    Some(PathBuf::from("cabundle.pem"))
}

fn default_cache() -> bool {
    true
}

impl ScrapeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.page_items == 0 {
            bail!("page_items must be greater than zero");
        }
        if self.fields.is_empty() {
            bail!("no fields configured");
        }
        if let Some(reserved) = self
            .fields
            .iter()
            .find(|spec| RESERVED_KEYS.contains(&spec.name.as_str()))
        {
            bail!("field name '{}' is reserved", reserved.name);
        }
        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.jsonl", self.project_name))
    }

    pub fn cache_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.sqlite", self.project_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldPosition;

    const MINIMAL: &str = r#"{
        "project_name": "jkr_tender",
        "url": "https://portal.example/tender/senarai.php",
        "source_agency": "JKR",
        "fields": {"title": [0, 2], "closing_date": [1, 5]}
    }"#;

    #[test]
    fn applies_defaults() {
        let config = ScrapeConfig::from_json(MINIMAL).unwrap();

        assert_eq!(config.start_offset, 0);
        assert_eq!(config.page_items, 20);
        assert_eq!(config.ca_bundle, Some(PathBuf::from("cabundle.pem")));
        assert!(config.cache);
        assert_eq!(config.layout, PortalLayout::default());
        assert_eq!(config.fields.get("closing_date"), Some(FieldPosition(1, 5)));
        assert_eq!(config.output_path(), PathBuf::from("jkr_tender.jsonl"));
        assert_eq!(config.cache_path(), PathBuf::from("jkr_tender.sqlite"));
    }

    #[test]
    fn reads_overrides() {
        let config = ScrapeConfig::from_json(
            r#"{
                "project_name": "p",
                "url": "https://portal.example/list",
                "source_agency": "JKR",
                "fields": {"title": [0, 2]},
                "start_offset": 40,
                "page_items": 50,
                "ca_bundle": null,
                "cache": false,
                "layout": {"listing_table_class": "results"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.start_offset, 40);
        assert_eq!(config.page_items, 50);
        assert_eq!(config.ca_bundle, None);
        assert!(!config.cache);
        assert_eq!(config.layout.listing_table_class, "results");
        assert_eq!(config.layout.detail_table_class, "mt2");
    }

    #[test]
    fn rejects_reserved_field_names() {
        let raw = MINIMAL.replace("closing_date", "source_url");
        let err = ScrapeConfig::from_json(&raw).unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn rejects_zero_page_items() {
        let raw = MINIMAL.replace(r#""fields""#, r#""page_items": 0, "fields""#);
        assert!(ScrapeConfig::from_json(&raw).is_err());
    }

    #[test]
    fn rejects_bad_url() {
        let raw = MINIMAL.replace("https://portal.example/tender/senarai.php", "not a url");
        assert!(ScrapeConfig::from_json(&raw).is_err());
    }
}
