//! Common types for parsers

use std::path::PathBuf;

/// A package recorded in `composer.lock`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    /// Where the package was downloaded from (`notification-url` or `dist.url`)
    pub source_url: Option<String>,
}

impl InstalledPackage {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            source_url: None,
        }
    }

    pub fn with_source_url(mut self, url: &str) -> Self {
        self.source_url = Some(url.to_string());
        self
    }
}

/// Vendor prefix of a package name
pub fn vendor_of(package_name: &str) -> &str {
    package_name
        .split_once('/')
        .map_or(package_name, |(vendor, _)| vendor)
}

/// A `composer`-type repository declared in `composer.json`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerRepository {
    pub url: String,
}

/// Error type for reading project files
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("File not found: {0:?}")]
    NotFound(PathBuf),

    #[error("Invalid {path:?}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
