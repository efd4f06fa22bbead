//! Fetching and parsing tululu.org: shared client, retry loop, endpoints and page parsers.

mod client;
mod error;

pub mod retry;
pub mod tululu;

pub use client::{FetchOutcome, PoliteClient, PoliteClientBuilder};
pub use error::{FetchError, ScraperError};
pub use retry::{fetch_with_retry, Backoff, Fetched, RetryPolicy};

use crate::logging::Diagnostics;
use reqwest::Url;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://tululu.org";
/// Science fiction category.
pub const DEFAULT_CATEGORY: u32 = 55;
/// Last listing page of the default category.
pub const DEFAULT_LAST_PAGE: u32 = 701;

/// Endpoints of one catalog category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    base: Url,
    category: u32,
}

impl Catalog {
    pub fn new(base_url: &str, category: u32) -> Result<Self, FetchError> {
        let mut base = Url::parse(base_url).map_err(|e| FetchError::InvalidUrl {
            input: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl {
                input: base_url.to_string(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base, category })
    }

    pub fn category(&self) -> u32 {
        self.category
    }

    fn join(&self, path: &str) -> Result<Url, FetchError> {
        self.base.join(path).map_err(|e| FetchError::InvalidUrl {
            input: format!("{}{}", self.base, path),
            reason: e.to_string(),
        })
    }

    /// `{base}/l{category}/{page}`
    pub fn listing_url(&self, page: u32) -> Result<Url, FetchError> {
        self.join(&format!("l{}/{}", self.category, page))
    }

    /// `{base}/b{id}/`
    pub fn detail_url(&self, id: u32) -> Result<Url, FetchError> {
        self.join(&format!("b{}/", id))
    }

    /// `{base}/txt.php?id={id}`
    pub fn text_url(&self, id: u32) -> Result<Url, FetchError> {
        let mut url = self.join("txt.php")?;
        url.query_pairs_mut().append_pair("id", &id.to_string());
        Ok(url)
    }
}

/// Everything a crawl step needs to fetch a catalog resource.
pub struct Session<'a> {
    pub client: &'a mut PoliteClient,
    pub catalog: &'a Catalog,
    pub timeout: Duration,
    pub retry: &'a RetryPolicy,
    pub diag: &'a dyn Diagnostics,
}

impl Session<'_> {
    /// GET `url` under this session's timeout and retry policy.
    pub fn fetch(&mut self, url: &Url) -> Result<Fetched, FetchError> {
        fetch_with_retry(self.client, url, self.timeout, self.retry, self.diag)
    }
}
