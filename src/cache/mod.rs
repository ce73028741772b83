use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, Sqlite, SqlitePool, migrate::MigrateDatabase};
use tracing::{debug, info};
use url::Url;

use crate::traits::{FetchedPage, PageFetcher};

/// On-disk store of fetched pages, keyed by request URL.
pub struct ResponseCache {
    pool: SqlitePool,
}

impl ResponseCache {
    pub async fn open(path: &Path) -> Result<Self> {
        let db_url = format!("sqlite:{}", path.display());

        // Create database file if it doesn't exist
        if !Sqlite::database_exists(&db_url).await.unwrap_or(false) {
            info!("Creating response cache {}", path.display());
            Sqlite::create_database(&db_url).await?;
        }

        let pool = SqlitePool::connect(&db_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("Response cache ready at {}", path.display());
        Ok(Self { pool })
    }

    pub async fn get(&self, request_url: &Url) -> Result<Option<FetchedPage>> {
        let row = sqlx::query("SELECT final_url, body FROM responses WHERE request_url = ?")
            .bind(request_url.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let final_url: String = row.get("final_url");
        Ok(Some(FetchedPage {
            url: Url::parse(&final_url)?,
            status: 200,
            body: row.get("body"),
        }))
    }

    pub async fn put(&self, request_url: &Url, page: &FetchedPage) -> Result<()> {
        let fetched_at: DateTime<Utc> = Utc::now();

        sqlx::query(
            r"
            INSERT OR REPLACE INTO responses (request_url, final_url, body, fetched_at)
            VALUES (?, ?, ?, ?)
            ",
        )
        .bind(request_url.as_str())
        .bind(page.url.as_str())
        .bind(&page.body)
        .bind(fetched_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

}

/// Serves pages from a [`ResponseCache`] and falls back to the wrapped fetcher,
/// storing successful responses.
pub struct CachedFetcher<F> {
    inner: F,
    cache: ResponseCache,
}

impl<F: PageFetcher> CachedFetcher<F> {
    pub fn new(inner: F, cache: ResponseCache) -> Self {
        Self { inner, cache }
    }

}

#[async_trait]
impl<F: PageFetcher> PageFetcher for CachedFetcher<F> {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        if let Some(page) = self.cache.get(url).await? {
            debug!("Cache hit for {}", url);
            return Ok(page);
        }

        let page = self.inner.fetch(url).await?;
        if page.is_success() {
            self.cache.put(url, &page).await?;
        }
        Ok(page)
    }
}
