//! Shared integration test utilities

#![allow(dead_code)]

pub mod fetcher;
pub mod project;

pub use fetcher::StubFetcher;
pub use project::{TestProject, create_checker, seven_package_project};
