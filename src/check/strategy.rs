//! Strategy resolution
//!
//! Decides per package which lookup applies. First matching rule wins:
//! 1. package name in `skip_packages`
//! 2. vendor prefix in `skip_vendors`
//! 3. explicit vendor page URL
//! 4. discovered private repository
//! 5. public registry

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::config::CheckConfig;
use crate::parser::types::{InstalledPackage, vendor_of};
use crate::version::fetcher::Credentials;

/// Authenticated repository serving a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateRepo {
    pub repo_url: String,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Listed in `skip_packages`
    Package,
    /// Vendor listed in `skip_vendors`
    Vendor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Skip { reason: SkipReason },
    Registry,
    VendorPage { url: String },
    PrivateRepo { repo: PrivateRepo },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Skip,
    Registry,
    VendorPage,
    PrivateRepo,
}

impl Resolution {
    pub fn method(&self) -> Method {
        match self {
            Resolution::Skip { .. } => Method::Skip,
            Resolution::Registry => Method::Registry,
            Resolution::VendorPage { .. } => Method::VendorPage,
            Resolution::PrivateRepo { .. } => Method::PrivateRepo,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Resolution::Skip { .. })
    }
}

/// An installed package paired with its lookup strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: String,
    pub resolution: Resolution,
}

pub struct StrategyResolver {
    skip_packages: HashSet<String>,
    skip_vendors: HashSet<String>,
    url_mappings: HashMap<String, String>,
    private_repos: HashMap<String, PrivateRepo>,
}

impl StrategyResolver {
    pub fn new(config: &CheckConfig, private_repos: HashMap<String, PrivateRepo>) -> Self {
        Self {
            skip_packages: config.skip_packages.iter().cloned().collect(),
            skip_vendors: config.skip_vendors.iter().cloned().collect(),
            url_mappings: config.package_url_mappings.clone(),
            private_repos,
        }
    }

    pub fn resolve(&self, package_name: &str) -> Resolution {
        if self.skip_packages.contains(package_name) {
            return Resolution::Skip {
                reason: SkipReason::Package,
            };
        }
        if self.skip_vendors.contains(vendor_of(package_name)) {
            return Resolution::Skip {
                reason: SkipReason::Vendor,
            };
        }
        if let Some(url) = self.url_mappings.get(package_name) {
            return Resolution::VendorPage { url: url.clone() };
        }
        if let Some(repo) = self.private_repos.get(package_name) {
            return Resolution::PrivateRepo { repo: repo.clone() };
        }
        Resolution::Registry
    }

    /// Resolve every package, keyed by name in manifest order
    pub fn resolve_all(&self, packages: &[InstalledPackage]) -> IndexMap<String, ResolvedPackage> {
        packages
            .iter()
            .map(|package| {
                (
                    package.name.clone(),
                    ResolvedPackage {
                        name: package.name.clone(),
                        version: package.version.clone(),
                        resolution: self.resolve(&package.name),
                    },
                )
            })
            .collect()
    }
}
