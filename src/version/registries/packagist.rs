//! Packagist (public Composer registry) implementation

use std::sync::Arc;

use tracing::{debug, warn};

use crate::version::fetcher::{FetchRequest, Fetcher};
use crate::version::registries::index::PackagesDocument;
use crate::version::semver::first_stable;

/// Looks up the latest stable release of a package on a Composer registry
pub struct PackagistRegistry {
    fetcher: Arc<dyn Fetcher>,
    base_url: String,
}

impl PackagistRegistry {
    /// Creates a new PackagistRegistry rooted at `base_url`
    pub fn new(fetcher: Arc<dyn Fetcher>, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Metadata URL for a package (`{base}/p2/{vendor}/{name}.json`)
    pub fn package_url(&self, package_name: &str) -> String {
        format!("{}/p2/{}.json", self.base_url, package_name)
    }

    pub fn request(&self, package_name: &str) -> FetchRequest {
        FetchRequest::api(&self.package_url(package_name))
    }

    /// Latest stable version, or `None` when the registry has nothing usable.
    ///
    /// Releases are listed newest first, so the first stable entry wins.
    pub async fn latest_version(&self, package_name: &str) -> Option<String> {
        let request = self.request(package_name);

        let page = match self.fetcher.fetch(&request).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Registry lookup for {} failed: {}", package_name, e);
                return None;
            }
        };

        if !page.is_success() {
            debug!(
                "Registry returned status {} for {}",
                page.status, package_name
            );
            return None;
        }

        let document = match PackagesDocument::parse(&page.body) {
            Ok(document) => document,
            Err(e) => {
                warn!("Invalid registry response for {}: {}", package_name, e);
                return None;
            }
        };

        document
            .packages
            .get(package_name)
            .and_then(|releases| first_stable(releases.versions()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::fetcher::HttpFetcher;
    use mockito::Server;

    fn registry(server: &Server) -> PackagistRegistry {
        PackagistRegistry::new(Arc::new(HttpFetcher::new()), &server.url())
    }

    #[tokio::test]
    async fn latest_version_returns_first_stable_release() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/p2/mageplaza/module-smtp.json")
            .with_status(200)
            .with_body(
                r#"{"packages":{"mageplaza/module-smtp":[
                    {"version":"4.8.0-beta1"},
                    {"version":"4.7.6"},
                    {"version":"4.7.5"}
                ]}}"#,
            )
            .create_async()
            .await;

        let result = registry(&server)
            .latest_version("mageplaza/module-smtp")
            .await;

        mock.assert_async().await;
        assert_eq!(result, Some("4.7.6".to_string()));
    }

    #[tokio::test]
    async fn latest_version_strips_v_prefix() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/p2/test/pkg.json")
            .with_status(200)
            .with_body(r#"{"packages":{"test/pkg":[{"version":"v2.1.0"}]}}"#)
            .create_async()
            .await;

        let result = registry(&server).latest_version("test/pkg").await;

        assert_eq!(result, Some("2.1.0".to_string()));
    }

    #[tokio::test]
    async fn latest_version_returns_none_when_only_prereleases_exist() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/p2/test/pkg.json")
            .with_status(200)
            .with_body(r#"{"packages":{"test/pkg":[{"version":"2.0.0-RC1"},{"version":"dev-master"}]}}"#)
            .create_async()
            .await;

        let result = registry(&server).latest_version("test/pkg").await;

        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn latest_version_returns_none_for_not_found() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/p2/test/missing.json")
            .with_status(404)
            .create_async()
            .await;

        let result = registry(&server).latest_version("test/missing").await;

        mock.assert_async().await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn latest_version_returns_none_for_invalid_json() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/p2/test/pkg.json")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let result = registry(&server).latest_version("test/pkg").await;

        assert_eq!(result, None);
    }

    #[test]
    fn package_url_uses_p2_layout() {
        let registry = PackagistRegistry::new(
            Arc::new(HttpFetcher::new()),
            "https://repo.packagist.org/",
        );

        assert_eq!(
            registry.package_url("amasty/promo"),
            "https://repo.packagist.org/p2/amasty/promo.json"
        );
    }
}
