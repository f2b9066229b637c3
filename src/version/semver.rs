//! Version string helpers shared by every lookup source
//!
//! Composer versions are free-form: `v1.2`, `2.4.6-p3`, `1.0.0-RC1`,
//! `dev-master`, four-part `1.2.3.4`. Ordering follows the usual Composer
//! rules: numeric components compare numerically, pre-release words sort
//! below a release and patch words (`p`, `pl`, `patch`) sort above it.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

/// Substrings that mark a release as unstable (matched case-insensitively)
pub const PRERELEASE_MARKERS: &[&str] = &["dev", "alpha", "beta", "rc"];

static RELEASE_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\.\d+(?:\.\d+)?").expect("release shape regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareResult {
    /// Installed equals latest
    Latest,
    /// Installed is older than latest
    Outdated,
    /// Installed is newer than latest
    Newer,
}

/// Strip a single leading `v` (`v1.2.3` -> `1.2.3`)
pub fn strip_v(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

pub fn is_prerelease(version: &str) -> bool {
    let lower = version.to_ascii_lowercase();
    PRERELEASE_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

/// True when the version starts with `major.minor[.patch]`
pub fn has_release_shape(version: &str) -> bool {
    RELEASE_SHAPE.is_match(version)
}

/// Stable candidate after `v` stripping, or None if the release should be skipped
fn stable_candidate(version: &str) -> Option<&str> {
    if is_prerelease(version) {
        return None;
    }
    let stripped = strip_v(version);
    has_release_shape(stripped).then_some(stripped)
}

/// First stable release in the given order.
///
/// Used for indexes that list releases newest-first.
pub fn first_stable<'a, I>(versions: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    versions
        .into_iter()
        .find_map(stable_candidate)
        .map(str::to_string)
}

/// Highest stable release regardless of listing order
pub fn max_stable<'a, I>(versions: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    versions
        .into_iter()
        .filter_map(stable_candidate)
        .max_by(|a, b| compare_version_strings(a, b))
        .map(str::to_string)
}

/// Highest version among arbitrary matches (used for pick-highest scraping)
pub fn max_version<'a, I>(versions: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    versions
        .into_iter()
        .max_by(|a, b| compare_version_strings(a, b))
        .map(|v| strip_v(v).to_string())
}

/// Compare an installed version against the latest known version
pub fn compare_versions(installed: &str, latest: &str) -> CompareResult {
    match compare_version_strings(installed, latest) {
        Ordering::Equal => CompareResult::Latest,
        Ordering::Less => CompareResult::Outdated,
        Ordering::Greater => CompareResult::Newer,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Component {
    /// Unknown words sort lowest
    Word(u8),
    Number(u64),
    /// `p`, `pl`, `patch` sort above any number
    Patch,
}

fn word_component(word: &str) -> Component {
    match word.to_ascii_lowercase().as_str() {
        "dev" => Component::Word(1),
        "alpha" | "a" => Component::Word(2),
        "beta" | "b" => Component::Word(3),
        "rc" => Component::Word(4),
        "p" | "pl" | "patch" => Component::Patch,
        _ => Component::Word(0),
    }
}

fn components(version: &str) -> Vec<Component> {
    let mut out = Vec::new();
    for part in strip_v(version.trim()).split(['.', '-', '_', '+']) {
        let mut rest = part;
        while !rest.is_empty() {
            let is_digit = rest.starts_with(|c: char| c.is_ascii_digit());
            let end = rest
                .find(|c: char| c.is_ascii_digit() != is_digit)
                .unwrap_or(rest.len());
            let (token, tail) = rest.split_at(end);
            out.push(if is_digit {
                Component::Number(token.parse().unwrap_or(u64::MAX))
            } else {
                word_component(token)
            });
            rest = tail;
        }
    }
    out
}

/// Component-wise ordering; a missing component counts as `0`
pub fn compare_version_strings(a: &str, b: &str) -> Ordering {
    let left = components(a);
    let right = components(b);
    let len = left.len().max(right.len());

    (0..len)
        .map(|i| {
            let l = left.get(i).copied().unwrap_or(Component::Number(0));
            let r = right.get(i).copied().unwrap_or(Component::Number(0));
            l.cmp(&r)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}
