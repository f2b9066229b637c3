//! Vendor product page scraping

use std::sync::Arc;

use tracing::{debug, warn};

use crate::version::error::LookupError;
use crate::version::fetcher::{FetchRequest, FetchedPage, Fetcher};
use crate::version::patterns::PatternCatalog;
use crate::version::types::ChangelogEntry;

/// Body fragments served by anti-bot challenge pages
const CHALLENGE_MARKERS: &[&str] = &[
    "cf-browser-verification",
    "challenge-platform",
    "Just a moment",
    "cf_chl_opt",
    "Attention Required! | Cloudflare",
];

/// Data extracted from a single vendor page
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedPage {
    pub vendor: String,
    pub version: Option<String>,
    pub changelog: Vec<ChangelogEntry>,
}

pub struct VendorPageScraper {
    fetcher: Arc<dyn Fetcher>,
    catalog: Arc<PatternCatalog>,
}

impl VendorPageScraper {
    pub fn new(fetcher: Arc<dyn Fetcher>, catalog: Arc<PatternCatalog>) -> Self {
        Self { fetcher, catalog }
    }

    pub fn request(url: &str) -> FetchRequest {
        FetchRequest::browser(url)
    }

    /// Vendor whose pattern matches `url`
    pub fn vendor_for(&self, url: &str) -> Option<String> {
        self.catalog
            .for_url(url)
            .map(|pattern| pattern.vendor_name().to_string())
    }

    /// Fetch `url` and apply the matching vendor pattern
    ///
    /// # Errors
    /// * `Blocked` - 403 challenge page
    /// * `FetchFailed` - transport fault or any other non-2xx status
    /// * `UnknownVendor` - no pattern matches the URL
    pub async fn scrape(&self, url: &str) -> Result<ScrapedPage, LookupError> {
        let page = self
            .fetcher
            .fetch(&Self::request(url))
            .await
            .map_err(|e| LookupError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !page.is_success() {
            if is_challenge(&page) {
                warn!("Vendor page {} is behind an anti-bot challenge", url);
                return Err(LookupError::Blocked {
                    url: url.to_string(),
                });
            }
            return Err(LookupError::FetchFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", page.status),
            });
        }

        let pattern = self
            .catalog
            .for_url(url)
            .ok_or_else(|| LookupError::UnknownVendor(url.to_string()))?;

        let version = pattern.extract_version(&page.body);
        let changelog = pattern.extract_changelog(&page.body);
        debug!(
            "Scraped {} ({}): version {:?}, {} changelog entries",
            url,
            pattern.vendor_name(),
            version,
            changelog.len()
        );

        Ok(ScrapedPage {
            vendor: pattern.vendor_name().to_string(),
            version,
            changelog,
        })
    }
}

fn is_challenge(page: &FetchedPage) -> bool {
    page.status == 403
        && CHALLENGE_MARKERS
            .iter()
            .any(|marker| page.body.contains(marker))
}
