//! Warm-up request planning for a batch of packages

use crate::check::strategy::{Resolution, ResolvedPackage};
use crate::version::fetcher::FetchRequest;
use crate::version::lookup::VersionLookup;

/// Every request the to-check packages may issue on their first pass.
///
/// The registry endpoint is included for all of them since it is the
/// fallback of the other two strategies.
pub fn plan_requests<'a, I>(lookup: &VersionLookup, packages: I) -> Vec<FetchRequest>
where
    I: IntoIterator<Item = &'a ResolvedPackage>,
{
    let mut requests = Vec::new();

    for package in packages {
        match &package.resolution {
            Resolution::VendorPage { url } => requests.push(lookup.vendor_page_request(url)),
            Resolution::PrivateRepo { repo } => requests.extend(lookup.private_repo_requests(
                &package.name,
                &repo.repo_url,
                &repo.credentials,
            )),
            Resolution::Registry | Resolution::Skip { .. } => {}
        }
        if !package.resolution.is_skip() {
            requests.push(lookup.registry_request(&package.name));
        }
    }

    requests
}
