//! Resolution orchestrator
//!
//! One run: resolve -> partition (skip / cached / to-check) -> warm the
//! fetch layer -> check -> write back to the cache -> flush once.

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info};

use crate::check::prefetch::plan_requests;
use crate::check::record::{CheckMethod, CheckRecord};
use crate::check::strategy::{PrivateRepo, Resolution, ResolvedPackage, StrategyResolver};
use crate::config::MAX_CONCURRENT_CHECKS;
use crate::parser::types::InstalledPackage;
use crate::version::cache::ResultCache;
use crate::version::lookup::VersionLookup;
use crate::version::types::Source;

const REGISTRY_UNAVAILABLE: &str = "No stable release found on the public registry";
const PRIVATE_REPO_UNAVAILABLE: &str =
    "Not found in private repository or public registry (credentials may have expired)";
const VENDOR_PAGE_UNAVAILABLE: &str = "Could not determine a version from the vendor page";

/// Lookup to run for a package that is not skipped
#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    Registry,
    VendorPage(&'a str),
    PrivateRepo(&'a PrivateRepo),
}

impl<'a> Target<'a> {
    fn of(resolution: &'a Resolution) -> Option<Self> {
        match resolution {
            Resolution::Skip { .. } => None,
            Resolution::Registry => Some(Target::Registry),
            Resolution::VendorPage { url } => Some(Target::VendorPage(url)),
            Resolution::PrivateRepo { repo } => Some(Target::PrivateRepo(repo)),
        }
    }
}

pub struct UpdateChecker {
    resolver: StrategyResolver,
    lookup: VersionLookup,
    cache: Option<ResultCache<CheckRecord>>,
    packages: Vec<InstalledPackage>,
}

impl UpdateChecker {
    pub fn new(
        resolver: StrategyResolver,
        lookup: VersionLookup,
        cache: Option<ResultCache<CheckRecord>>,
        packages: Vec<InstalledPackage>,
    ) -> Self {
        Self {
            resolver,
            lookup,
            cache,
            packages,
        }
    }

    /// Packages that would be reported for `filter` (skipped ones excluded)
    pub fn selected_packages(&self, filter: &[String]) -> Vec<ResolvedPackage> {
        self.resolver
            .resolve_all(&self.packages)
            .into_values()
            .filter(|package| filter.is_empty() || filter.contains(&package.name))
            .filter(|package| !package.resolution.is_skip())
            .collect()
    }

    pub async fn check_for_updates(&mut self, filter: &[String]) -> Vec<CheckRecord> {
        self.check_with_progress(filter, |_| {}).await
    }

    /// Check every selected package, calling `progress` as each record is ready.
    ///
    /// Records come back in manifest order.
    pub async fn check_with_progress<F>(
        &mut self,
        filter: &[String],
        mut progress: F,
    ) -> Vec<CheckRecord>
    where
        F: FnMut(&CheckRecord),
    {
        let selected = self.selected_packages(filter);
        let mut slots: Vec<Option<CheckRecord>> = vec![None; selected.len()];
        let mut to_check = Vec::new();

        for (index, package) in selected.iter().enumerate() {
            let cached = self
                .cache
                .as_mut()
                .and_then(|cache| cache.get(&package.name));
            match cached {
                Some(record) => {
                    debug!("Cache hit for {}", package.name);
                    let record = CheckRecord {
                        check_method: Some(CheckMethod::Cached),
                        ..record
                    };
                    progress(&record);
                    slots[index] = Some(record);
                }
                None => {
                    if let Some(target) = Target::of(&package.resolution) {
                        to_check.push((index, package, target));
                    }
                }
            }
        }

        info!(
            "{} packages selected: {} cached, {} to check",
            selected.len(),
            selected.len() - to_check.len(),
            to_check.len()
        );

        if !to_check.is_empty() {
            let requests = plan_requests(&self.lookup, to_check.iter().map(|(_, p, _)| *p));
            self.lookup.warm_up(requests).await;
        }

        let lookup = &self.lookup;
        let mut checked = stream::iter(to_check)
            .map(|(index, package, target)| async move {
                (index, check_package(lookup, package, target).await)
            })
            .buffered(MAX_CONCURRENT_CHECKS);

        let mut fresh = Vec::new();
        while let Some((index, record)) = checked.next().await {
            progress(&record);
            fresh.push((index, record));
        }
        drop(checked);

        if let Some(cache) = self.cache.as_mut() {
            for (_, record) in &fresh {
                cache.set(&record.package, record.clone());
            }
            if let Err(e) = cache.flush() {
                error!("Failed to persist result cache: {}", e);
            }
        }

        for (index, record) in fresh {
            slots[index] = Some(record);
        }

        slots.into_iter().flatten().collect()
    }
}

async fn check_package(
    lookup: &VersionLookup,
    package: &ResolvedPackage,
    target: Target<'_>,
) -> CheckRecord {
    let name = package.name.as_str();
    let installed = package.version.as_str();

    match target {
        Target::Registry => {
            let record = match lookup.registry_version(name).await {
                Some(latest) => CheckRecord::compared(name, installed, &latest, Source::Registry),
                None => CheckRecord::unavailable(name, installed, REGISTRY_UNAVAILABLE),
            };
            record.with_method(CheckMethod::Registry)
        }

        Target::PrivateRepo(repo) => {
            let record = match lookup
                .private_repo_version(name, &repo.repo_url, &repo.credentials)
                .await
            {
                Some(latest) => {
                    CheckRecord::compared(name, installed, &latest, Source::PrivateRepo)
                }
                None => match lookup.registry_version(name).await {
                    Some(latest) => {
                        debug!("{} not in {}, found on registry", name, repo.repo_url);
                        CheckRecord::compared(name, installed, &latest, Source::Registry)
                    }
                    None => CheckRecord::unavailable(name, installed, PRIVATE_REPO_UNAVAILABLE),
                },
            };
            record.with_method(CheckMethod::PrivateRepo)
        }

        Target::VendorPage(url) => {
            let record = match lookup.vendor_page_version(url, Some(name)).await {
                Ok(result) => match result.latest_version {
                    Some(latest) => CheckRecord::compared(name, installed, &latest, result.source)
                        .with_changes(result.changelog),
                    None => CheckRecord::unavailable(name, installed, VENDOR_PAGE_UNAVAILABLE),
                },
                Err(e) => CheckRecord::error(name, installed, &e.to_string()),
            };
            record.with_method(CheckMethod::VendorPage).with_url(url)
        }
    }
}
