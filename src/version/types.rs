//! Common types for version lookups

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a latest version came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Public package registry (Packagist)
    Registry,
    /// Scraped vendor product page
    VendorPage,
    /// Authenticated vendor repository
    PrivateRepo,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Registry => "registry",
            Source::VendorPage => "vendor_page",
            Source::PrivateRepo => "private_repo",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One changelog release scraped from a vendor page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub version: String,
    pub date: String,
    #[serde(default)]
    pub changes: Vec<String>,
}

/// Outcome of a vendor page lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupResult {
    pub url: String,
    /// Vendor whose pattern matched the URL
    pub vendor: Option<String>,
    pub latest_version: Option<String>,
    pub source: Source,
    pub changelog: Vec<ChangelogEntry>,
    pub checked_at: DateTime<Utc>,
}
