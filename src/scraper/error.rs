//! Error types for fetching and parsing catalog pages.

use thiserror::Error;

/// Failure of a fetch after the caller's retry policy has run.
///
/// `NotFound` and non-retryable variants are permanent for the item: the
/// caller logs them and moves on to the next page or id.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The site answered with a redirect, its way of saying the resource does not exist.
    #[error("Not found (redirected): {url}")]
    NotFound { url: String },

    #[error("HTTP {status} when fetching: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Network error: could not reach {url}: {reason}")]
    Transport {
        url: String,
        retryable: bool,
        reason: String,
    },

    #[error("Giving up on {url} after {attempts} attempt(s)")]
    RetriesExhausted { url: String, attempts: u32 },

    #[error("Invalid URL: {input}: {reason}")]
    InvalidUrl { input: String, reason: String },
}

/// Shared scraper error covering fetches and page parsing.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Could not parse book page {url}: {message}")]
    ParseDetailPage { url: String, message: String },

    #[error("Invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },
}

impl ScraperError {
    /// True when the error means "skip this item": redirects and unparseable pages alike.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ScraperError::Fetch(FetchError::NotFound { .. }) | ScraperError::ParseDetailPage { .. }
        )
    }
}
