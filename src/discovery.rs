//! Book id discovery: walk a range of category listing pages and collect book ids.

use crate::scraper::tululu::parse_listing_page;
use crate::scraper::{FetchError, ScraperError, Session};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("Start {kind} should be greater than 0")]
    StartTooSmall { kind: &'static str },

    #[error("End {kind} ({end}) should be greater than or equal to start {kind} ({start})")]
    EndBeforeStart {
        kind: &'static str,
        start: u32,
        end: u32,
    },

    #[error("End page should be equal to or less than {last}")]
    EndPastLastPage { end: u32, last: u32 },
}

/// Inclusive range of listing pages or book ids, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlRange {
    start: u32,
    end: u32,
}

impl CrawlRange {
    /// Page range `start..=end`; `end` may not exceed the catalog's `last_page`.
    pub fn pages(start: u32, end: u32, last_page: u32) -> Result<Self, RangeError> {
        let range = Self::checked(start, end, "page")?;
        if end > last_page {
            return Err(RangeError::EndPastLastPage {
                end,
                last: last_page,
            });
        }
        Ok(range)
    }

    /// Book id range `start..=end`.
    pub fn ids(start: u32, end: u32) -> Result<Self, RangeError> {
        Self::checked(start, end, "id")
    }

    fn checked(start: u32, end: u32, kind: &'static str) -> Result<Self, RangeError> {
        if start < 1 {
            return Err(RangeError::StartTooSmall { kind });
        }
        if end < start {
            return Err(RangeError::EndBeforeStart { kind, start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of pages or ids covered; never zero.
    pub fn count(&self) -> u32 {
        self.end - self.start + 1
    }

    pub fn iter(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end
    }
}

/// Collect book ids from every listing page in `range`, in page order then link order.
///
/// Missing pages are logged and skipped. Retryable network errors are retried on the
/// same page as the session's retry policy allows. Duplicates are kept.
pub fn discover(
    session: &mut Session<'_>,
    range: CrawlRange,
    progress: Option<&dyn Fn(u32, u32)>,
) -> Vec<u32> {
    session.diag.debug(&format!(
        "Discovering books on pages {}..={}",
        range.start(),
        range.end()
    ));
    let mut ids = Vec::new();
    let mut current = range.start();
    while current <= range.end() {
        if let Some(p) = progress {
            p(current - range.start() + 1, range.count());
        }
        match fetch_listing(session, current) {
            Ok(page_ids) => {
                session.diag.debug(&format!(
                    "Page {}: {} book(s)",
                    current,
                    page_ids.len()
                ));
                ids.extend(page_ids);
            }
            Err(ScraperError::Fetch(FetchError::NotFound { .. })) => {
                session
                    .diag
                    .error(&format!("Page {} was not found", current));
            }
            Err(e) => {
                session
                    .diag
                    .error(&format!("Page {} skipped: {}", current, e));
            }
        }
        current += 1;
    }
    ids
}

fn fetch_listing(session: &mut Session<'_>, page: u32) -> Result<Vec<u32>, ScraperError> {
    let url = session.catalog.listing_url(page)?;
    let fetched = session.fetch(&url)?;
    parse_listing_page(&String::from_utf8_lossy(&fetched.body))
}
