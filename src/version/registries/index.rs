//! Composer repository index documents
//!
//! Both the public registry and private repositories serve the same
//! `packages.json`-style documents. Two layouts exist for the per-package
//! releases:
//! - list of release objects (`p2/` metadata, newest first)
//! - map keyed by version string (legacy `p/` files and full indexes)

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Default, Deserialize)]
pub struct PackagesDocument {
    #[serde(default, deserialize_with = "object_or_empty")]
    pub packages: IndexMap<String, PackageReleases>,

    /// Inline provider hashes (`name -> sha256`)
    #[serde(default, deserialize_with = "object_or_empty")]
    pub providers: HashMap<String, ProviderHash>,

    /// Provider listing files, path template containing `%hash%`
    #[serde(
        default,
        rename = "provider-includes",
        deserialize_with = "object_or_empty"
    )]
    pub provider_includes: IndexMap<String, ProviderHash>,

    /// Template with `%package%` and `%hash%` placeholders
    #[serde(default, rename = "providers-url")]
    pub providers_url: Option<String>,
}

impl PackagesDocument {
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Whether the document points at per-package provider files
    pub fn has_provider_indirection(&self) -> bool {
        self.providers_url.is_some()
            && (!self.providers.is_empty() || !self.provider_includes.is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PackageReleases {
    List(Vec<Release>),
    Map(IndexMap<String, Release>),
}

impl PackageReleases {
    /// Version strings in document order
    pub fn versions(&self) -> Vec<&str> {
        match self {
            PackageReleases::List(releases) => releases
                .iter()
                .filter_map(|r| r.version.as_deref())
                .collect(),
            PackageReleases::Map(releases) => releases
                .iter()
                .map(|(key, r)| r.version.as_deref().unwrap_or(key))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderHash {
    pub sha256: String,
}

/// Composer emits `[]` for empty objects; treat anything but an object as empty
fn object_or_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_object() {
        serde_json::from_value(value).map_err(serde::de::Error::custom)
    } else {
        Ok(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_list_layout_in_order() {
        let doc = PackagesDocument::parse(
            r#"{"packages": {"test/pkg": [{"version": "2.0.0"}, {"version": "1.9.0"}]}}"#,
        )
        .unwrap();

        assert_eq!(doc.packages["test/pkg"].versions(), vec!["2.0.0", "1.9.0"]);
    }

    #[test]
    fn parse_reads_map_layout_in_order() {
        let doc = PackagesDocument::parse(
            r#"{"packages": {"test/pkg": {"1.0.0": {"version": "1.0.0"}, "dev-master": {}}}}"#,
        )
        .unwrap();

        assert_eq!(
            doc.packages["test/pkg"].versions(),
            vec!["1.0.0", "dev-master"]
        );
    }

    #[test]
    fn parse_tolerates_empty_array_sections() {
        let doc = PackagesDocument::parse(
            r#"{"packages": [], "providers-url": "/p/%package%$%hash%.json", "provider-includes": {"p/provider-latest$%hash%.json": {"sha256": "abc"}}}"#,
        )
        .unwrap();

        assert!(doc.packages.is_empty());
        assert!(doc.has_provider_indirection());
        assert_eq!(
            doc.provider_includes["p/provider-latest$%hash%.json"].sha256,
            "abc"
        );
    }

    #[test]
    fn parse_without_providers_url_has_no_indirection() {
        let doc = PackagesDocument::parse(r#"{"packages": {}}"#).unwrap();
        assert!(!doc.has_provider_indirection());
    }
}
