//! In-memory fetcher with per-URL request counting

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use vendor_check::version::error::FetchError;
use vendor_check::version::fetcher::{FetchRequest, FetchedPage, Fetcher};

/// Serves canned responses by URL; unknown URLs answer 404
#[derive(Default)]
pub struct StubFetcher {
    responses: HashMap<String, (u16, String)>,
    failures: HashMap<String, FetchError>,
    requests: Mutex<HashMap<String, usize>>,
    warmed: Mutex<Vec<FetchRequest>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: &str, status: u16, body: &str) -> Self {
        self.responses
            .insert(url.to_string(), (status, body.to_string()));
        self
    }

    pub fn with_failure(mut self, url: &str, error: FetchError) -> Self {
        self.failures.insert(url.to_string(), error);
        self
    }

    /// Registry metadata listing `versions` newest first
    pub fn with_registry(self, package: &str, versions: &[&str]) -> Self {
        let releases: Vec<serde_json::Value> = versions
            .iter()
            .map(|v| serde_json::json!({ "version": v }))
            .collect();
        let body = serde_json::json!({ "packages": { package: releases } }).to_string();
        self.with_response(
            &format!("https://repo.packagist.org/p2/{}.json", package),
            200,
            &body,
        )
    }

    pub fn requests_to(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        self.requests.lock().unwrap().values().sum()
    }

    pub fn warmed_urls(&self) -> Vec<String> {
        self.warmed
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }

    pub fn warmed_requests(&self) -> Vec<FetchRequest> {
        self.warmed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
        *self
            .requests
            .lock()
            .unwrap()
            .entry(request.url.clone())
            .or_default() += 1;

        if let Some(error) = self.failures.get(&request.url) {
            return Err(error.clone());
        }

        let (status, body) = self
            .responses
            .get(&request.url)
            .cloned()
            .unwrap_or((404, String::new()));

        Ok(FetchedPage {
            url: request.url.clone(),
            status,
            body,
        })
    }

    async fn warm(&self, requests: Vec<FetchRequest>) {
        self.warmed.lock().unwrap().extend(requests);
    }
}
