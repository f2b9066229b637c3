//! Per-vendor extraction rules for scraping versions from product pages
//!
//! Each vendor is identified by a URL substring (usually its domain). The
//! catalog is built once at startup and shared read-only.
//!
//! Changelog expressions use named capture groups:
//! - `version` (required): the release number
//! - `date` (optional): release date text, `"N/A"` when absent
//! - `changes` (optional): markup holding the individual change lines
//!
//! Without a `changes` group, a pattern may set an entry delimiter instead:
//! the changes are then the text between the end of an entry header and the
//! next delimiter match.

use std::sync::LazyLock;

use regex::Regex;

use crate::version::semver::max_version;
use crate::version::types::ChangelogEntry;

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<li[^>]*>(.*?)</li>").expect("list item regex is valid")
});

static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("markup regex is valid"));

/// Extraction rules for a single vendor
#[derive(Debug, Clone)]
pub struct VendorPattern {
    url_match: String,
    version: Regex,
    pick_highest: bool,
    changelog: Option<Regex>,
    entry_end: Option<Regex>,
    section: Option<Regex>,
}

impl VendorPattern {
    pub fn new(url_match: &str, version: Regex) -> Self {
        Self {
            url_match: url_match.to_string(),
            version,
            pick_highest: false,
            changelog: None,
            entry_end: None,
            section: None,
        }
    }

    /// Take the highest of all version matches instead of the first one
    pub fn with_pick_highest(mut self) -> Self {
        self.pick_highest = true;
        self
    }

    pub fn with_changelog(mut self, changelog: Regex) -> Self {
        self.changelog = Some(changelog);
        self
    }

    /// Changes of an entry run from its header up to the next match of `entry_end`
    pub fn with_entry_end(mut self, entry_end: Regex) -> Self {
        self.entry_end = Some(entry_end);
        self
    }

    /// Restrict extraction to the first capture group of this expression
    pub fn with_section(mut self, section: Regex) -> Self {
        self.section = Some(section);
        self
    }

    pub fn url_match(&self) -> &str {
        &self.url_match
    }

    pub fn pick_highest(&self) -> bool {
        self.pick_highest
    }

    /// Vendor name derived from the URL match (`amasty.com` -> `amasty`)
    pub fn vendor_name(&self) -> &str {
        self.url_match
            .split('.')
            .next()
            .unwrap_or(&self.url_match)
    }

    fn narrow<'h>(&self, html: &'h str) -> &'h str {
        self.section
            .as_ref()
            .and_then(|section| section.captures(html))
            .and_then(|caps| caps.get(1))
            .map_or(html, |m| m.as_str())
    }

    pub fn extract_version(&self, html: &str) -> Option<String> {
        let scope = self.narrow(html);

        if self.pick_highest {
            let matches: Vec<&str> = self
                .version
                .captures_iter(scope)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str())
                .collect();
            return max_version(matches);
        }

        self.version
            .captures(scope)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    pub fn extract_changelog(&self, html: &str) -> Vec<ChangelogEntry> {
        let Some(changelog) = &self.changelog else {
            return Vec::new();
        };
        let scope = self.narrow(html);

        changelog
            .captures_iter(scope)
            .filter_map(|caps| {
                let version = caps.name("version")?.as_str().to_string();
                let date = caps
                    .name("date")
                    .map(|m| strip_markup(m.as_str()))
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| "N/A".to_string());
                let changes = match (caps.name("changes"), &self.entry_end) {
                    (Some(m), _) => change_lines(m.as_str()),
                    (None, Some(entry_end)) => {
                        let rest = &scope[caps.get(0)?.end()..];
                        let body = entry_end.find(rest).map_or(rest, |m| &rest[..m.start()]);
                        change_lines(body)
                    }
                    (None, None) => Vec::new(),
                };
                Some(ChangelogEntry {
                    version,
                    date,
                    changes,
                })
            })
            .collect()
    }
}

fn strip_markup(text: &str) -> String {
    MARKUP.replace_all(text, "").trim().to_string()
}

/// Individual change lines from `<li>` items, or from `*`/`-` bullets in plain text
fn change_lines(markup: &str) -> Vec<String> {
    let items: Vec<String> = LIST_ITEM
        .captures_iter(markup)
        .filter_map(|caps| caps.get(1))
        .map(|m| strip_markup(m.as_str()))
        .filter(|line| !line.is_empty())
        .collect();
    if !items.is_empty() {
        return items;
    }

    strip_markup(markup)
        .lines()
        .map(|line| line.trim().trim_start_matches(['*', '-', '•']).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lookup table of vendor patterns keyed by URL match
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    patterns: Vec<VendorPattern>,
}

impl PatternCatalog {
    pub fn new(patterns: Vec<VendorPattern>) -> Self {
        Self { patterns }
    }

    /// Pattern set for the vendors this tool knows out of the box
    pub fn builtin() -> Self {
        Self::new(builtin_patterns())
    }

    /// First pattern whose URL match occurs in `url`
    pub fn for_url(&self, url: &str) -> Option<&VendorPattern> {
        self.patterns.iter().find(|p| url.contains(p.url_match()))
    }

    pub fn supported_vendors(&self) -> Vec<&str> {
        self.patterns.iter().map(VendorPattern::vendor_name).collect()
    }
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in vendor pattern is valid")
}

fn builtin_patterns() -> Vec<VendorPattern> {
    let changelog_div = r#"(?is)<div[^>]*class="[^"]*changelog[^"]*"[^>]*>(.*?)</div>"#;

    vec![
        VendorPattern::new("amasty.com", re(r"(?i)Version\s+(\d+\.\d+\.\d+)"))
            .with_changelog(re(
                r"(?i)<h3[^>]*>Version\s+(?P<version>\d+\.\d+\.\d+)[^<]*</h3>\s*<p[^>]*>(?P<date>[^<]+)</p>",
            ))
            .with_section(re(changelog_div)),
        VendorPattern::new("mageplaza.com", re(r"(?i)v(\d+\.\d+\.\d+)"))
            .with_changelog(re(
                r"##\s*v?(?P<version>\d+\.\d+\.\d+)\s*\((?P<date>[^)]+)\)",
            ))
            .with_entry_end(re("##")),
        VendorPattern::new("bsscommerce.com", re(r"(?i)Version:?\s*(\d+\.\d+\.\d+)"))
            .with_changelog(re(
                r"(?is)<h4[^>]*>(?P<version>\d+\.\d+\.\d+)[^<]*</h4>\s*<ul>(?P<changes>.*?)</ul>",
            )),
        VendorPattern::new("aheadworks.com", re(r"(?i)Version\s+(\d+\.\d+\.\d+)")).with_changelog(
            re(r"(?i)Release\s+(?P<version>\d+\.\d+\.\d+)\s*-\s*(?P<date>[^<\n]+)"),
        ),
        VendorPattern::new("mageme.com", re(r"(\d+\.\d+\.\d+)"))
            .with_pick_highest()
            .with_changelog(re(
                r"(?i)(?P<version>\d+\.\d+\.\d+)\s+(?P<date>(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+\d+\s+\d{4})",
            ))
            .with_section(re(r"(?is)CHANGE\s+LOG(.*?)(?:Frequently|\z)")),
        VendorPattern::new("mageworx.com", re(r"(?i)Version:?\s*(\d+\.\d+\.\d+)"))
            .with_changelog(re(
                r"(?i)Version:?\s*(?P<version>\d+\.\d+\.\d+)\s*\((?P<date>[^)]+)\)",
            ))
            .with_section(re(changelog_div)),
        VendorPattern::new("xtento.com", re(r"(?i)Version:?\s*(\d+\.\d+\.\d+)"))
            .with_changelog(re(
                r"=====\s*(?P<version>\d+\.\d+\.\d+)\s*=====\s*\*",
            ))
            .with_entry_end(re("====="))
            .with_section(re(r"(?is)CHANGELOG(.*?)(?:This extension|\z)")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn builtin_patterns_compile() {
        let catalog = PatternCatalog::builtin();
        assert_eq!(catalog.patterns.len(), 7);
    }

    #[rstest]
    #[case("https://amasty.com/special-promotions-for-magento-2.html", Some("amasty.com"))]
    #[case("https://www.xtento.com/magento-extensions/x.html", Some("xtento.com"))]
    #[case("https://mageme.com/magento-2-form-builder.html", Some("mageme.com"))]
    #[case("https://example.org/product.html", None)]
    fn for_url_matches_vendor_substring(#[case] url: &str, #[case] expected: Option<&str>) {
        let catalog = PatternCatalog::builtin();
        assert_eq!(catalog.for_url(url).map(|p| p.url_match()), expected);
    }

    #[test]
    fn supported_vendors_lists_names_without_tld() {
        let catalog = PatternCatalog::builtin();
        let vendors = catalog.supported_vendors();
        assert!(vendors.contains(&"amasty"));
        assert!(vendors.contains(&"xtento"));
        assert!(vendors.contains(&"mageplaza"));
    }

    #[test]
    fn only_mageme_picks_highest() {
        let catalog = PatternCatalog::builtin();
        let picking: Vec<&str> = catalog
            .patterns
            .iter()
            .filter(|p| p.pick_highest())
            .map(|p| p.url_match())
            .collect();
        assert_eq!(picking, vec!["mageme.com"]);
    }

    #[test]
    fn extract_version_takes_first_match_by_default() {
        let pattern = VendorPattern::new("example.com", re(r"Version\s+(\d+\.\d+\.\d+)"));
        let html = "<p>Version 2.1.0</p><p>Version 3.0.0</p>";
        assert_eq!(pattern.extract_version(html), Some("2.1.0".to_string()));
    }

    #[test]
    fn extract_version_picks_highest_when_enabled() {
        let pattern =
            VendorPattern::new("example.com", re(r"(\d+\.\d+\.\d+)")).with_pick_highest();
        let html = "<p>Works with 2.4.6</p><p>3.9.1 Jan 5 2024</p><p>3.10.0 Mar 1 2024</p>";
        assert_eq!(pattern.extract_version(html), Some("3.10.0".to_string()));
    }

    #[test]
    fn extract_version_restricts_to_section() {
        let pattern = VendorPattern::new("example.com", re(r"(\d+\.\d+\.\d+)"))
            .with_section(re(r"(?s)CHANGE LOG(.*)"));
        let html = "Magento 2.4.7 compatible. CHANGE LOG 1.3.2 fixes";
        assert_eq!(pattern.extract_version(html), Some("1.3.2".to_string()));
    }

    #[test]
    fn extract_version_falls_back_to_whole_page_when_section_missing() {
        let pattern = VendorPattern::new("example.com", re(r"Version\s+(\d+\.\d+\.\d+)"))
            .with_section(re(r"(?s)CHANGE LOG(.*)"));
        assert_eq!(
            pattern.extract_version("Version 1.0.4"),
            Some("1.0.4".to_string())
        );
    }

    #[test]
    fn extract_version_returns_none_without_match() {
        let catalog = PatternCatalog::builtin();
        let pattern = catalog.for_url("https://amasty.com/x.html").unwrap();
        assert_eq!(pattern.extract_version("<html>nothing here</html>"), None);
    }

    #[test]
    fn extract_changelog_reads_list_items_and_strips_markup() {
        let catalog = PatternCatalog::builtin();
        let pattern = catalog.for_url("https://bsscommerce.com/x.html").unwrap();
        let html = r#"
            <h4>1.2.0 (latest)</h4>
            <ul><li>Added <b>approval</b> emails</li><li>Fixed grid filter</li></ul>
            <h4>1.1.0</h4>
            <ul><li>Compatible with 2.4.6</li></ul>
        "#;

        let entries = pattern.extract_changelog(html);

        assert_eq!(
            entries,
            vec![
                ChangelogEntry {
                    version: "1.2.0".to_string(),
                    date: "N/A".to_string(),
                    changes: vec![
                        "Added approval emails".to_string(),
                        "Fixed grid filter".to_string()
                    ],
                },
                ChangelogEntry {
                    version: "1.1.0".to_string(),
                    date: "N/A".to_string(),
                    changes: vec!["Compatible with 2.4.6".to_string()],
                },
            ]
        );
    }

    #[test]
    fn extract_changelog_reads_dates() {
        let catalog = PatternCatalog::builtin();
        let pattern = catalog.for_url("https://www.mageplaza.com/smtp/").unwrap();
        let html = "## v4.7.1 (2024-03-02)\n* Fix queue\n## v4.7.0 (2024-01-10)\n* Initial";

        let entries = pattern.extract_changelog(html);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].version, "4.7.1");
        assert_eq!(entries[0].date, "2024-03-02");
        assert_eq!(entries[0].changes, vec!["Fix queue".to_string()]);
        assert_eq!(entries[1].date, "2024-01-10");
    }

    #[test]
    fn extract_changelog_keeps_hash_inside_change_text() {
        let catalog = PatternCatalog::builtin();
        let pattern = catalog.for_url("https://www.mageplaza.com/smtp/").unwrap();
        let html = "## v4.7.1 (2024-03-02)\n* Fix issue #123\n* Add retry\n## v4.7.0 (2024-01-10)\n* Initial";

        let entries = pattern.extract_changelog(html);

        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].changes,
            vec!["Fix issue #123".to_string(), "Add retry".to_string()]
        );
        assert_eq!(entries[1].changes, vec!["Initial".to_string()]);
    }

    #[test]
    fn extract_changelog_keeps_equals_inside_change_text() {
        let catalog = PatternCatalog::builtin();
        let pattern = catalog.for_url("https://www.xtento.com/x.html").unwrap();
        let html = "===== 2.16.4 =====\n* Fixed qty=0 export\n* Added filter\n=====\n===== 2.16.3 =====\n* Initial";

        let entries = pattern.extract_changelog(html);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].version, "2.16.4");
        assert_eq!(
            entries[0].changes,
            vec!["Fixed qty=0 export".to_string(), "Added filter".to_string()]
        );
        assert_eq!(entries[1].changes, vec!["Initial".to_string()]);
    }

    #[test]
    fn extract_changelog_is_empty_without_changelog_pattern() {
        let pattern = VendorPattern::new("example.com", re(r"(\d+\.\d+\.\d+)"));
        assert!(pattern.extract_changelog("1.0.0 Jan 1 2024").is_empty());
    }
}
