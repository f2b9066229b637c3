//! Project fixtures: lock file, composer.json, auth.json and configuration

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use vendor_check::check::{StrategyResolver, UpdateChecker};
use vendor_check::config::{self, CheckConfig};
use vendor_check::discovery::load_private_repos;
use vendor_check::parser::read_installed_packages;
use vendor_check::version::cache::ResultCache;
use vendor_check::version::fetcher::Fetcher;
use vendor_check::version::lookup::VersionLookup;
use vendor_check::version::patterns::PatternCatalog;

pub const AMASTY_URL: &str = "https://amasty.com/special-promotions-for-magento-2.html";
pub const XTENTO_URL: &str =
    "https://www.xtento.com/magento-extensions/magento-order-export-module.html";
pub const XTENTO_REPO: &str = "https://repo.xtento.com";

const SEVEN_PACKAGE_LOCK: &str = r#"{
    "packages": [
        {"name": "amasty/promo", "version": "2.12.0",
         "dist": {"type": "zip", "url": "https://composer.amasty.com/enterprise/dist/amasty/promo.zip"}},
        {"name": "xtento/orderexport", "version": "2.16.0",
         "notification-url": "https://repo.xtento.com/downloads/"},
        {"name": "stripe/stripe-payments", "version": "3.4.0",
         "dist": {"type": "zip", "url": "https://api.github.com/repos/stripe/stripe-magento2/zipball/abc"}},
        {"name": "klaviyo/magento2-extension", "version": "4.1.2",
         "notification-url": "https://packagist.org/downloads/"},
        {"name": "magento/framework", "version": "103.0.7",
         "notification-url": "https://repo.magento.com/downloads/"},
        {"name": "laminas/laminas-validator", "version": "2.30.0",
         "notification-url": "https://packagist.org/downloads/"},
        {"name": "getjohn/module-customsprice", "version": "1.0.0"}
    ],
    "packages-dev": []
}"#;

const COMPOSER_JSON: &str = r#"{
    "repositories": {
        "magento": {"type": "composer", "url": "https://repo.magento.com/"},
        "xtento": {"type": "composer", "url": "https://repo.xtento.com"}
    }
}"#;

const AUTH_JSON: &str = r#"{
    "http-basic": {
        "repo.magento.com": {"username": "public", "password": "private"},
        "repo.xtento.com": {"username": "customer", "password": "licence"}
    }
}"#;

pub struct TestProject {
    pub dir: TempDir,
    pub config: CheckConfig,
}

impl TestProject {
    pub fn lock_path(&self) -> PathBuf {
        self.dir.path().join("composer.lock")
    }

    pub fn cache_dir(&self) -> PathBuf {
        config::cache_dir_for(&self.lock_path())
    }

    pub fn write(&self, name: &str, content: &str) {
        std::fs::write(self.dir.path().join(name), content).unwrap();
    }

    /// Resolve xtento/orderexport through its private repository instead of its page
    pub fn without_page_mappings(mut self) -> Self {
        self.config.package_url_mappings.clear();
        self
    }
}

/// Seven installed packages; three are skipped by the configuration
pub fn seven_package_project() -> TestProject {
    let dir = TempDir::new().unwrap();
    let project = TestProject {
        dir,
        config: CheckConfig::from_json(&format!(
            r#"{{
                "package_url_mappings": {{
                    "amasty/promo": "{}",
                    "xtento/orderexport": "{}"
                }},
                "skip_hosts": ["repo.magento.com"],
                "skip_patterns": ["(?i)\\.satis\\."],
                "skip_vendors": ["magento", "laminas"],
                "skip_packages": ["getjohn/module-customsprice"]
            }}"#,
            AMASTY_URL, XTENTO_URL
        ))
        .unwrap(),
    };
    project.write("composer.lock", SEVEN_PACKAGE_LOCK);
    project.write("composer.json", COMPOSER_JSON);
    project.write("auth.json", AUTH_JSON);
    project
}

/// Build a checker the same way the binary does
pub fn create_checker(
    project: &TestProject,
    fetcher: Arc<dyn Fetcher>,
    use_cache: bool,
) -> UpdateChecker {
    let lock_path = project.lock_path();
    let packages = read_installed_packages(&lock_path).unwrap();
    let private_repos =
        load_private_repos(&config::lock_dir(&lock_path), &packages, &project.config).unwrap();
    let cache = use_cache.then(|| ResultCache::new(&project.cache_dir(), 3600));

    UpdateChecker::new(
        StrategyResolver::new(&project.config, private_repos),
        VersionLookup::new(
            fetcher,
            config::DEFAULT_REGISTRY_URL,
            Arc::new(PatternCatalog::builtin()),
        ),
        cache,
        packages,
    )
}
