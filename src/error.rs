//! Failures that end a scrape run.
//!
//! Field-position misses are not errors: they are recorded on the record
//! itself (see [`crate::models::FieldValue`]) and the run continues.

use thiserror::Error;

/// Structural and transport failures raised by the portal pipeline.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("no element with class `{class}` found on {url}")]
    MissingTable { class: String, url: String },

    #[error("results table on {url} has no footer")]
    MissingFooter { url: String },

    #[error("listing row {row} on {url} has no detail link")]
    MissingDetailLink { row: usize, url: String },

    #[error("cannot resolve detail link `{href}` against {base}: {source}")]
    InvalidDetailLink {
        href: String,
        base: String,
        #[source]
        source: url::ParseError,
    },

    #[error("detail URL {url} has no `{param}` query parameter")]
    MissingProjectNumber { url: String, param: String },

    #[error("invalid CSS selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },
}
