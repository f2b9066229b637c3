//! Private repository discovery
//!
//! Maps installed packages to the authenticated `composer` repositories
//! declared next to the lock file. A package belongs to a repository when the
//! host of its download URL equals the repository host.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;
use tracing::{debug, warn};

use crate::check::strategy::PrivateRepo;
use crate::config::{CheckConfig, ConfigError};
use crate::parser::auth_json::AuthConfig;
use crate::parser::types::{ComposerRepository, InstalledPackage, ParseError};
use crate::parser::read_repositories;

fn host_of(url: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
}

fn is_skipped_host(host: &str, config: &CheckConfig, patterns: &[Regex]) -> bool {
    config
        .skip_hosts
        .iter()
        .any(|skip| skip.eq_ignore_ascii_case(host))
        || patterns.iter().any(|pattern| pattern.is_match(host))
}

pub fn discover_private_repos(
    repositories: &[ComposerRepository],
    auth: &AuthConfig,
    packages: &[InstalledPackage],
    config: &CheckConfig,
) -> Result<HashMap<String, PrivateRepo>, ConfigError> {
    let patterns = config.compiled_skip_patterns()?;
    let mut repos_by_host: HashMap<String, PrivateRepo> = HashMap::new();

    for repository in repositories {
        let Some(host) = host_of(&repository.url) else {
            debug!("Ignoring repository with unparsable URL {}", repository.url);
            continue;
        };
        if is_skipped_host(&host, config, &patterns) {
            debug!("Skipping repository host {}", host);
            continue;
        }
        let Some(credentials) = auth.credentials_for(&host) else {
            debug!("No credentials for repository host {}", host);
            continue;
        };
        repos_by_host.entry(host).or_insert_with(|| PrivateRepo {
            repo_url: repository.url.trim_end_matches('/').to_string(),
            credentials: credentials.clone(),
        });
    }

    let mapped: HashMap<String, PrivateRepo> = packages
        .iter()
        .filter_map(|package| {
            let host = host_of(package.source_url.as_deref()?)?;
            let repo = repos_by_host.get(&host)?;
            Some((package.name.clone(), repo.clone()))
        })
        .collect();

    debug!(
        "Discovered {} private repositories serving {} packages",
        repos_by_host.len(),
        mapped.len()
    );
    Ok(mapped)
}

/// Discovery from `composer.json` and `auth.json` in `project_dir`.
///
/// Either file missing means no private repositories; unreadable files are
/// logged and ignored.
pub fn load_private_repos(
    project_dir: &Path,
    packages: &[InstalledPackage],
    config: &CheckConfig,
) -> Result<HashMap<String, PrivateRepo>, ConfigError> {
    let repositories = match read_repositories(&project_dir.join("composer.json")) {
        Ok(repositories) => repositories,
        Err(ParseError::NotFound(_)) => return Ok(HashMap::new()),
        Err(e) => {
            warn!("Ignoring composer.json: {}", e);
            return Ok(HashMap::new());
        }
    };

    let auth = match AuthConfig::load(&project_dir.join("auth.json")) {
        Ok(auth) => auth,
        Err(ParseError::NotFound(_)) => return Ok(HashMap::new()),
        Err(e) => {
            warn!("Ignoring auth.json: {}", e);
            return Ok(HashMap::new());
        }
    };

    discover_private_repos(&repositories, &auth, packages, config)
}
