//! tululu: crawler for the tululu.org book catalog. Discovers book ids from category
//! listing pages, downloads texts and covers, and writes a JSON manifest.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod logging;
pub mod manifest;
pub mod model;
pub mod paths;
pub mod pipeline;
pub mod scraper;

// Re-exports for CLI and consumers.
pub use discovery::{discover, CrawlRange, RangeError};
pub use logging::{Diagnostics, MemoryDiagnostics, TracingDiagnostics};
pub use manifest::{Manifest, PersistError};
pub use model::BookRecord;
pub use pipeline::{process, DownloadOptions, ItemError, ProcessOutcome, RunSummary};
pub use scraper::{
    fetch_with_retry, Backoff, Catalog, FetchError, FetchOutcome, PoliteClient,
    PoliteClientBuilder, RetryPolicy, ScraperError, Session,
};
