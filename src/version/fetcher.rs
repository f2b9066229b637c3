//! HTTP fetch layer shared by every lookup source
//!
//! Every outcome is memoized by URL for the lifetime of the fetcher, so a
//! warm-up pass can issue requests concurrently and the per-package lookups
//! that follow are served from memory.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::stream::{self, StreamExt};
#[cfg(test)]
use mockall::automock;
use tracing::{debug, warn};

use crate::config::{FETCH_TIMEOUT_MS, MAX_CONCURRENT_FETCHES, PRIVATE_FETCH_TIMEOUT_MS};
use crate::version::error::FetchError;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const API_USER_AGENT: &str = concat!("vendor-check/", env!("CARGO_PKG_VERSION"));

/// HTTP basic credentials for a private repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.username.trim().is_empty()
    }
}

/// Request signature to use for a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestProfile {
    /// Looks like a desktop browser; vendor pages often reject other clients
    Browser,
    /// Public JSON API
    Api,
    /// Private repository with basic auth and a longer timeout
    Authenticated,
}

impl RequestProfile {
    pub fn timeout(&self) -> Duration {
        match self {
            RequestProfile::Browser | RequestProfile::Api => {
                Duration::from_millis(FETCH_TIMEOUT_MS)
            }
            RequestProfile::Authenticated => Duration::from_millis(PRIVATE_FETCH_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub profile: RequestProfile,
    pub credentials: Option<Credentials>,
}

impl FetchRequest {
    pub fn browser(url: &str) -> Self {
        Self {
            url: url.to_string(),
            profile: RequestProfile::Browser,
            credentials: None,
        }
    }

    pub fn api(url: &str) -> Self {
        Self {
            url: url.to_string(),
            profile: RequestProfile::Api,
            credentials: None,
        }
    }

    pub fn authenticated(url: &str, credentials: &Credentials) -> Self {
        Self {
            url: url.to_string(),
            profile: RequestProfile::Authenticated,
            credentials: Some(credentials.clone()),
        }
    }
}

/// A completed HTTP exchange, whatever its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for fetching remote documents
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches a single URL
    ///
    /// # Returns
    /// * `Ok(FetchedPage)` - Any completed exchange, including 4xx/5xx statuses
    /// * `Err(FetchError)` - Timeouts, DNS failures and other transport faults
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError>;

    /// Primes the fetcher for a batch of requests ahead of the lookups that need them.
    ///
    /// Must not change any later outcome, only its latency.
    async fn warm(&self, requests: Vec<FetchRequest>);
}

type Outcome = Result<FetchedPage, FetchError>;

/// reqwest-backed fetcher with per-URL memoization
pub struct HttpFetcher {
    client: reqwest::Client,
    memo: Mutex<HashMap<String, Outcome>>,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            memo: Mutex::new(HashMap::new()),
        }
    }

    fn memo(&self) -> MutexGuard<'_, HashMap<String, Outcome>> {
        self.memo.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remembered(&self, url: &str) -> Option<Outcome> {
        self.memo().get(url).cloned()
    }

    async fn send(&self, request: &FetchRequest) -> Outcome {
        let mut builder = self
            .client
            .get(&request.url)
            .timeout(request.profile.timeout());

        builder = match request.profile {
            RequestProfile::Browser => builder
                .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
                .header(reqwest::header::ACCEPT, BROWSER_ACCEPT)
                .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9"),
            RequestProfile::Api | RequestProfile::Authenticated => builder
                .header(reqwest::header::USER_AGENT, API_USER_AGENT)
                .header(reqwest::header::ACCEPT, "application/json"),
        };

        if let Some(credentials) = &request.credentials {
            builder = builder.basic_auth(&credentials.username, Some(&credentials.password));
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!("Fetched {} ({})", request.url, status);

        Ok(FetchedPage {
            url: request.url.clone(),
            status,
            body,
        })
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
        if let Some(outcome) = self.remembered(&request.url) {
            debug!("Serving {} from fetch memo", request.url);
            return outcome;
        }

        let outcome = self.send(request).await;
        if let Err(e) = &outcome {
            warn!("Request to {} failed: {}", request.url, e);
        }
        self.memo().insert(request.url.clone(), outcome.clone());
        outcome
    }

    async fn warm(&self, requests: Vec<FetchRequest>) {
        let mut seen = HashSet::new();
        let pending: Vec<FetchRequest> = requests
            .into_iter()
            .filter(|r| seen.insert(r.url.clone()))
            .filter(|r| self.remembered(&r.url).is_none())
            .collect();

        if pending.is_empty() {
            return;
        }

        debug!("Warming fetch memo with {} requests", pending.len());

        stream::iter(pending)
            .map(|request| async move {
                let _ = self.fetch(&request).await;
            })
            .buffer_unordered(MAX_CONCURRENT_FETCHES)
            .collect::<Vec<()>>()
            .await;
    }
}
