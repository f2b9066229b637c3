//! Per-package result records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RECENT_CHANGES_LIMIT;
use crate::version::semver::{CompareResult, compare_versions};
use crate::version::types::{ChangelogEntry, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateStatus {
    UpToDate,
    UpdateAvailable,
    AheadOfVendor,
    Unavailable,
    Error,
}

impl UpdateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStatus::UpToDate => "UP_TO_DATE",
            UpdateStatus::UpdateAvailable => "UPDATE_AVAILABLE",
            UpdateStatus::AheadOfVendor => "AHEAD_OF_VENDOR",
            UpdateStatus::Unavailable => "UNAVAILABLE",
            UpdateStatus::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CompareResult> for UpdateStatus {
    fn from(result: CompareResult) -> Self {
        match result {
            CompareResult::Latest => UpdateStatus::UpToDate,
            CompareResult::Outdated => UpdateStatus::UpdateAvailable,
            CompareResult::Newer => UpdateStatus::AheadOfVendor,
        }
    }
}

/// How a record was produced in this run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMethod {
    Registry,
    VendorPage,
    PrivateRepo,
    Cached,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub package: String,
    pub installed_version: String,
    pub latest_version: Option<String>,
    pub status: UpdateStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_method: Option<CheckMethod>,
    /// Vendor page that was consulted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_changes: Option<Vec<ChangelogEntry>>,
    pub checked_at: DateTime<Utc>,
}

impl CheckRecord {
    fn base(package: &str, installed_version: &str, status: UpdateStatus) -> Self {
        Self {
            package: package.to_string(),
            installed_version: installed_version.to_string(),
            latest_version: None,
            status,
            source: None,
            check_method: None,
            url: None,
            error: None,
            recent_changes: None,
            checked_at: Utc::now(),
        }
    }

    /// Record for a resolved latest version, status from comparison
    pub fn compared(package: &str, installed_version: &str, latest: &str, source: Source) -> Self {
        let status = compare_versions(installed_version, latest).into();
        Self {
            latest_version: Some(latest.to_string()),
            source: Some(source),
            ..Self::base(package, installed_version, status)
        }
    }

    pub fn unavailable(package: &str, installed_version: &str, message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::base(package, installed_version, UpdateStatus::Unavailable)
        }
    }

    pub fn error(package: &str, installed_version: &str, message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::base(package, installed_version, UpdateStatus::Error)
        }
    }

    pub fn with_method(mut self, method: CheckMethod) -> Self {
        self.check_method = Some(method);
        self
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    /// Attach the most recent changelog entries; an empty changelog attaches nothing
    pub fn with_changes(mut self, changelog: Vec<ChangelogEntry>) -> Self {
        if !changelog.is_empty() {
            self.recent_changes = Some(changelog.into_iter().take(RECENT_CHANGES_LIMIT).collect());
        }
        self
    }
}
