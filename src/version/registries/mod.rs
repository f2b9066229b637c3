//! Lookup sources for package versions

pub mod index;
pub mod packagist;
pub mod private_repo;
pub mod vendor_page;

pub use packagist::PackagistRegistry;
pub use private_repo::PrivateRepoClient;
pub use vendor_page::VendorPageScraper;
