use std::collections::HashMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default result cache TTL in seconds (1 hour)
pub const DEFAULT_CACHE_TTL_SECS: i64 = 60 * 60;

/// Timeout for public fetches (registry, vendor pages) in milliseconds
pub const FETCH_TIMEOUT_MS: u64 = 15_000;

/// Timeout for authenticated private repository fetches in milliseconds
pub const PRIVATE_FETCH_TIMEOUT_MS: u64 = 30_000;

// =============================================================================
// Limits
// =============================================================================

/// Upper bound on in-flight requests during warm-up
pub const MAX_CONCURRENT_FETCHES: usize = 8;

/// Upper bound on packages checked concurrently
pub const MAX_CONCURRENT_CHECKS: usize = 4;

/// Changelog entries kept on a result record
pub const RECENT_CHANGES_LIMIT: usize = 3;

// =============================================================================
// Locations
// =============================================================================

/// Default public registry
pub const DEFAULT_REGISTRY_URL: &str = "https://repo.packagist.org";

/// Cache directory created next to the lock file
pub const CACHE_DIR_NAME: &str = ".vendor-check-cache";

/// File holding the persisted result map
pub const CACHE_FILE_NAME: &str = "results.db";

/// Log file written under the data directory with `--log-file`
pub const LOG_FILE_NAME: &str = "vendor-check.log";

const BUNDLED_CONFIG: &str = include_str!("../config/packages.json");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid skip pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// Package tracking configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct CheckConfig {
    /// Package name -> vendor product page to scrape
    pub package_url_mappings: HashMap<String, String>,
    /// Packages known to be tracked through the public registry (informational)
    pub registry_packages: Vec<String>,
    /// Repository hosts excluded from private repository discovery
    pub skip_hosts: Vec<String>,
    /// Regex patterns on repository hosts excluded from discovery
    pub skip_patterns: Vec<String>,
    /// Vendor prefixes never checked
    pub skip_vendors: Vec<String>,
    /// Package names never checked
    pub skip_packages: Vec<String>,
}

impl CheckConfig {
    /// Configuration shipped with the tool
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_json(BUNDLED_CONFIG)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load from `path`, or the bundled configuration when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_json(&content)
            }
            None => Self::bundled(),
        }
    }

    pub fn compiled_skip_patterns(&self) -> Result<Vec<Regex>, ConfigError> {
        self.skip_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }
}

/// Returns the path to the data directory for vendor-check.
/// Uses $XDG_DATA_HOME/vendor-check if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/vendor-check,
/// or ./vendor-check if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join(LOG_FILE_NAME)
}

/// Cache directory for a given lock file
pub fn cache_dir_for(lock_path: &Path) -> PathBuf {
    lock_dir(lock_path).join(CACHE_DIR_NAME)
}

/// Directory containing the lock file (and its composer.json / auth.json)
pub fn lock_dir(lock_path: &Path) -> PathBuf {
    let resolved = lock_path
        .canonicalize()
        .unwrap_or_else(|_| lock_path.to_path_buf());
    resolved
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("vendor-check")
}
