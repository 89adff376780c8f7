use crate::models::Listing;
use crate::sources::extract::listings_from_values;
use crate::sources::traits::ListingSource;
use crate::sources::types::{FeedPage, SearchFilters};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Listing source backed by a search service exposing `POST /search`.
///
/// The service answers with `{ "listings": [...], "hasNextPage": bool }` and
/// may report a failed upstream search through an `error` field.
pub struct FeedSource {
    client: Client,
    base_url: String,
    max_pages: u32,
}

impl FeedSource {
    /// Create a feed source for the service at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration, max_pages: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("listing-tracker/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            max_pages: max_pages.max(1),
        })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url.trim_end_matches('/'))
    }

    async fn fetch_page(&self, filters: &SearchFilters) -> Result<FeedPage> {
        let url = self.search_url();
        debug!("Requesting page {} from {}", filters.page, url);

        let response = self
            .client
            .post(&url)
            .json(filters)
            .send()
            .await
            .context("Failed to reach listing feed")?;

        if !response.status().is_success() {
            warn!("Listing feed returned status: {}", response.status());
            anyhow::bail!("Listing feed request failed: {}", response.status());
        }

        response
            .json::<FeedPage>()
            .await
            .context("Failed to decode listing feed response")
    }
}

/// Append a page's listings to `out`, returning whether another page follows.
///
/// A page carrying an `error` fails the whole fetch.
pub(crate) fn absorb_page(page: FeedPage, out: &mut Vec<Listing>) -> Result<bool> {
    if let Some(error) = page.error {
        anyhow::bail!("Listing feed reported an error: {}", error);
    }
    let received = page.listings.len();
    out.extend(listings_from_values(&page.listings));
    Ok(page.has_next_page && received > 0)
}

#[async_trait]
impl ListingSource for FeedSource {
    async fn fetch(&self, filters: &SearchFilters) -> Result<Vec<Listing>> {
        info!("Starting listing fetch from {}", self.base_url);

        let mut listings = Vec::new();
        let mut page = filters.page.max(1);
        let mut fetched_pages = 0;

        loop {
            let body = self.fetch_page(&filters.with_page(page)).await?;
            fetched_pages += 1;
            let has_next = absorb_page(body, &mut listings)?;

            if !has_next {
                break;
            }
            if fetched_pages >= self.max_pages {
                warn!(
                    max_pages = self.max_pages,
                    "Page limit reached, snapshot may be incomplete"
                );
                break;
            }
            page += 1;
        }

        info!(
            "Fetched {} listings over {} pages",
            listings.len(),
            fetched_pages
        );
        Ok(listings)
    }

    fn source_name(&self) -> &'static str {
        "feed"
    }
}
