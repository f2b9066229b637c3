//! Authenticated vendor-operated Composer repositories
//!
//! Endpoints are tried in order, first one that knows the package wins:
//! 1. `{base}/p2/{name}.json`
//! 2. `{base}/p/{name}.json`
//! 3. `{base}/packages.json`
//!
//! A root index may hold the releases directly or point at per-package
//! provider files through `provider-includes` / `providers-url`.

use std::sync::Arc;

use tracing::debug;

use crate::version::error::LookupError;
use crate::version::fetcher::{Credentials, FetchRequest, Fetcher};
use crate::version::registries::index::PackagesDocument;
use crate::version::semver::max_stable;

pub struct PrivateRepoClient {
    fetcher: Arc<dyn Fetcher>,
}

impl PrivateRepoClient {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Candidate index URLs for a package, in lookup order
    pub fn endpoint_urls(package_name: &str, repo_url: &str) -> [String; 3] {
        let base = repo_url.trim_end_matches('/');
        [
            format!("{}/p2/{}.json", base, package_name),
            format!("{}/p/{}.json", base, package_name),
            format!("{}/packages.json", base),
        ]
    }

    pub fn endpoint_requests(
        package_name: &str,
        repo_url: &str,
        credentials: &Credentials,
    ) -> Vec<FetchRequest> {
        Self::endpoint_urls(package_name, repo_url)
            .iter()
            .map(|url| FetchRequest::authenticated(url, credentials))
            .collect()
    }

    /// Latest stable version across the endpoint chain.
    ///
    /// Failing endpoints are skipped; `None` means every path was exhausted.
    pub async fn latest_version(
        &self,
        package_name: &str,
        repo_url: &str,
        credentials: &Credentials,
    ) -> Option<String> {
        if credentials.is_blank() {
            debug!("No credentials for {}, skipping private lookup", repo_url);
            return None;
        }

        for url in Self::endpoint_urls(package_name, repo_url) {
            match self
                .version_from_endpoint(package_name, repo_url, &url, credentials)
                .await
            {
                Ok(Some(version)) => return Some(version),
                Ok(None) => debug!("{} has no stable release of {}", url, package_name),
                Err(e) => debug!("Skipping endpoint {}: {}", url, e),
            }
        }

        None
    }

    async fn version_from_endpoint(
        &self,
        package_name: &str,
        repo_url: &str,
        url: &str,
        credentials: &Credentials,
    ) -> Result<Option<String>, LookupError> {
        let document = self.fetch_document(url, credentials).await?;

        if let Some(version) = Self::direct_version(&document, package_name) {
            return Ok(Some(version));
        }

        if document.has_provider_indirection() {
            return Ok(self
                .resolve_providers(&document, package_name, repo_url, credentials)
                .await);
        }

        Ok(None)
    }

    fn direct_version(document: &PackagesDocument, package_name: &str) -> Option<String> {
        document
            .packages
            .get(package_name)
            .and_then(|releases| max_stable(releases.versions()))
    }

    async fn fetch_document(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> Result<PackagesDocument, LookupError> {
        let page = self
            .fetcher
            .fetch(&FetchRequest::authenticated(url, credentials))
            .await
            .map_err(|e| LookupError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !page.is_success() {
            return Err(LookupError::FetchFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", page.status),
            });
        }

        PackagesDocument::parse(&page.body)
            .map_err(|e| LookupError::InvalidResponse(format!("{}: {}", url, e)))
    }

    /// Follow `providers` / `provider-includes` to the package's own file.
    ///
    /// Candidate hashes are tried in order (inline providers, then each
    /// include) until one provider file yields a stable release.
    async fn resolve_providers(
        &self,
        root: &PackagesDocument,
        package_name: &str,
        repo_url: &str,
        credentials: &Credentials,
    ) -> Option<String> {
        let template = root.providers_url.as_deref()?;

        if let Some(provider) = root.providers.get(package_name)
            && let Some(version) = self
                .provider_version(template, &provider.sha256, package_name, repo_url, credentials)
                .await
        {
            return Some(version);
        }

        for (include_path, include) in &root.provider_includes {
            let url = resolve_url(repo_url, &include_path.replace("%hash%", &include.sha256));
            let listing = match self.fetch_document(&url, credentials).await {
                Ok(listing) => listing,
                Err(e) => {
                    debug!("Skipping provider include {}: {}", url, e);
                    continue;
                }
            };
            let Some(provider) = listing.providers.get(package_name) else {
                continue;
            };
            if let Some(version) = self
                .provider_version(template, &provider.sha256, package_name, repo_url, credentials)
                .await
            {
                return Some(version);
            }
        }

        None
    }

    async fn provider_version(
        &self,
        template: &str,
        hash: &str,
        package_name: &str,
        repo_url: &str,
        credentials: &Credentials,
    ) -> Option<String> {
        let path = template
            .replace("%package%", package_name)
            .replace("%hash%", hash);
        let url = resolve_url(repo_url, &path);

        match self.fetch_document(&url, credentials).await {
            Ok(document) => Self::direct_version(&document, package_name),
            Err(e) => {
                debug!("Provider file {} unavailable: {}", url, e);
                None
            }
        }
    }
}

/// Resolve a path from an index against the repository.
///
/// Absolute URLs pass through, `/`-rooted paths use the repository origin,
/// everything else is relative to the repository base.
pub fn resolve_url(repo_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    let base = repo_url.trim_end_matches('/');
    if path.starts_with('/') {
        let origin = reqwest::Url::parse(base)
            .map(|url| url.origin().ascii_serialization())
            .unwrap_or_else(|_| base.to_string());
        return format!("{}{}", origin, path);
    }

    format!("{}/{}", base, path)
}
