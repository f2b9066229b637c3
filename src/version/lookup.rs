//! Version lookup engine
//!
//! Composes the three lookup sources over one shared [`Fetcher`], adding the
//! fallback from vendor pages to the public registry.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::version::error::LookupError;
use crate::version::fetcher::{Credentials, FetchRequest, Fetcher};
use crate::version::patterns::PatternCatalog;
use crate::version::registries::{PackagistRegistry, PrivateRepoClient, VendorPageScraper};
use crate::version::types::{LookupResult, Source};

pub struct VersionLookup {
    fetcher: Arc<dyn Fetcher>,
    registry: PackagistRegistry,
    scraper: VendorPageScraper,
    private_repos: PrivateRepoClient,
}

impl VersionLookup {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        registry_url: &str,
        catalog: Arc<PatternCatalog>,
    ) -> Self {
        Self {
            registry: PackagistRegistry::new(fetcher.clone(), registry_url),
            scraper: VendorPageScraper::new(fetcher.clone(), catalog),
            private_repos: PrivateRepoClient::new(fetcher.clone()),
            fetcher,
        }
    }

    /// Latest stable release on the public registry
    pub async fn registry_version(&self, package_name: &str) -> Option<String> {
        self.registry.latest_version(package_name).await
    }

    /// Latest version from a vendor product page.
    ///
    /// When a package name is given, the registry is consulted if the page
    /// yields no version or cannot be fetched. An unknown vendor is never
    /// retried against the registry.
    pub async fn vendor_page_version(
        &self,
        url: &str,
        package_name: Option<&str>,
    ) -> Result<LookupResult, LookupError> {
        let scraped = match self.scraper.scrape(url).await {
            Ok(scraped) => scraped,
            Err(e @ (LookupError::FetchFailed { .. } | LookupError::Blocked { .. })) => {
                if let Some(name) = package_name
                    && let Some(version) = self.registry_version(name).await
                {
                    info!("Vendor page {} failed ({}), using registry for {}", url, e, name);
                    return Ok(LookupResult {
                        url: url.to_string(),
                        vendor: self.scraper.vendor_for(url),
                        latest_version: Some(version),
                        source: Source::Registry,
                        changelog: Vec::new(),
                        checked_at: Utc::now(),
                    });
                }
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let (latest_version, source) = match (scraped.version, package_name) {
            (Some(version), _) => (Some(version), Source::VendorPage),
            (None, Some(name)) => {
                debug!("No version on {}, trying registry for {}", url, name);
                match self.registry_version(name).await {
                    Some(version) => (Some(version), Source::Registry),
                    None => (None, Source::VendorPage),
                }
            }
            (None, None) => (None, Source::VendorPage),
        };

        Ok(LookupResult {
            url: url.to_string(),
            vendor: Some(scraped.vendor),
            latest_version,
            source,
            changelog: scraped.changelog,
            checked_at: Utc::now(),
        })
    }

    /// Latest stable release from an authenticated repository
    pub async fn private_repo_version(
        &self,
        package_name: &str,
        repo_url: &str,
        credentials: &Credentials,
    ) -> Option<String> {
        self.private_repos
            .latest_version(package_name, repo_url, credentials)
            .await
    }

    pub fn registry_request(&self, package_name: &str) -> FetchRequest {
        self.registry.request(package_name)
    }

    pub fn vendor_page_request(&self, url: &str) -> FetchRequest {
        VendorPageScraper::request(url)
    }

    pub fn private_repo_requests(
        &self,
        package_name: &str,
        repo_url: &str,
        credentials: &Credentials,
    ) -> Vec<FetchRequest> {
        if credentials.is_blank() {
            return Vec::new();
        }
        PrivateRepoClient::endpoint_requests(package_name, repo_url, credentials)
    }

    /// Prime the fetch layer; lookups afterwards return the same results
    pub async fn warm_up(&self, requests: Vec<FetchRequest>) {
        self.fetcher.warm(requests).await;
    }
}
