use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Certificate, Client};
use tracing::{debug, info, warn};
use url::Url;

use crate::traits::{FetchedPage, PageFetcher};

/// HTTP session shared by every request of a run.
#[derive(Clone)]
pub struct HttpSession {
    client: Client,
}

impl HttpSession {
    /// Session verifying TLS against the platform's built-in roots.
    pub fn new() -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    /// Session whose TLS verification is pinned to the certificates in a PEM bundle.
    pub fn with_ca_bundle(path: &Path) -> Result<Self> {
        let pem = std::fs::read(path)
            .with_context(|| format!("Failed to read CA bundle {}", path.display()))?;

        let certs = Certificate::from_pem_bundle(&pem)
            .with_context(|| format!("Invalid certificate in {}", path.display()))?;
        if certs.is_empty() {
            return Err(anyhow::anyhow!(
                "CA bundle {} contains no PEM certificates",
                path.display()
            ));
        }

        let count = certs.len();
        let mut builder = Client::builder().tls_built_in_root_certs(false);
        for cert in certs {
            builder = builder.add_root_certificate(cert);
        }

        info!("Loaded {} root certificates from {}", count, path.display());
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Session honouring an optional CA bundle.
    pub fn from_bundle(ca_bundle: Option<&Path>) -> Result<Self> {
        match ca_bundle {
            Some(path) => Self::with_ca_bundle(path),
            None => Self::new(),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpSession {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        debug!("GET {}", url);

        let response = self.client.get(url.clone()).send().await?;

        // error pages are still parsed; missing tables surface downstream
        let status = response.status();
        if !status.is_success() {
            warn!("GET {} returned {}", url, status);
        }

        let final_url = response.url().clone();
        let body = response.text().await?;

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}

/// Build the listing URL for a given offset, keeping the base URL's own query.
pub fn listing_url(base: &Url, offset_param: &str, offset: u32) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair(offset_param, &offset.to_string());
    url
}
