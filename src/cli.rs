//! CLI parsing and orchestration. Validates the crawl range, discovers ids, downloads
//! every book and writes the manifest. Maps errors to exit codes.

use crate::config::{self, Config};
use crate::discovery::{discover, CrawlRange, RangeError};
use crate::logging::{self, TracingDiagnostics};
use crate::manifest::PersistError;
use crate::pipeline::{self, DownloadOptions};
use crate::scraper::{
    Backoff, Catalog, PoliteClient, RetryPolicy, Session, DEFAULT_BASE_URL,
    DEFAULT_CATEGORY, DEFAULT_LAST_PAGE,
};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_DEST_FOLDER: &str = "tululu_books";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DELAY_SECS: u64 = 0;
const DEFAULT_RETRY_BACKOFF_SECS: u64 = 5;
const DEFAULT_MAX_BACKOFF_SECS: u64 = 300;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Range(#[from] RangeError),

    #[error("{0}")]
    Persist(#[from] PersistError),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) | CliRunError::Range(_) => 1,
            CliRunError::Persist(_) => 2,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "tululu")]
#[command(
    about = "Download books from tululu.org: texts into books/, covers into images/, metadata into books_details.json"
)]
#[command(
    after_help = "Config file keys (dest_folder, user_agent, timeout_secs, request_delay_secs, retry_backoff_secs, backoff, max_backoff_secs, max_attempts, base_url, category, last_page, log_file) are read from ./tululu.toml or the user config dir. CLI flags override config."
)]
pub struct Args {
    /// First listing page of the category to crawl.
    #[arg(long = "start_page", default_value_t = 1)]
    pub start_page: u32,

    /// Last listing page (inclusive). Defaults to the start page.
    #[arg(long = "end_page")]
    pub end_page: Option<u32>,

    /// Download an explicit range of book ids instead of walking listing pages.
    #[arg(long = "start_id", conflicts_with_all = ["start_page", "end_page"])]
    pub start_id: Option<u32>,

    /// Last book id (inclusive) when --start_id is used. Defaults to the start id.
    #[arg(long = "end_id", requires = "start_id")]
    pub end_id: Option<u32>,

    /// Folder for books/, images/ and books_details.json (default tululu_books).
    #[arg(long = "dest_folder")]
    pub dest_folder: Option<PathBuf>,

    /// Do not download cover images.
    #[arg(long = "skip_imgs")]
    pub skip_imgs: bool,

    /// Do not download book texts.
    #[arg(long = "skip_txt")]
    pub skip_txt: bool,

    /// Request timeout in seconds (overrides config; default 10).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Catalog category to list (overrides config; default 55, science fiction).
    #[arg(long)]
    pub category: Option<u32>,

    /// Catalog base URL (overrides config; default https://tululu.org).
    #[arg(long = "base_url")]
    pub base_url: Option<String>,

    /// HTTP User-Agent (overrides config).
    #[arg(long = "user_agent")]
    pub user_agent: Option<String>,

    /// Give up on a page or book after this many network failures. Default: retry forever.
    #[arg(long = "max_attempts")]
    pub max_attempts: Option<u32>,

    /// Append debug logs to this file.
    #[arg(long = "log_file")]
    pub log_file: Option<PathBuf>,

    /// Suppress progress output (errors and book names only).
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug logging on stderr and verbose error chain.
    #[arg(long)]
    pub verbose: bool,
}

/// What to crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlTarget {
    Pages(CrawlRange),
    Ids(CrawlRange),
}

/// Effective settings after merging CLI flags, config file and defaults.
#[derive(Debug)]
pub struct Settings {
    pub target: CrawlTarget,
    pub catalog: Catalog,
    pub download: DownloadOptions,
    pub timeout: Duration,
    pub delay_secs: u64,
    pub user_agent: Option<String>,
    pub retry: RetryPolicy,
    pub log_file: Option<PathBuf>,
}

fn parse_backoff(s: &str, max: Duration) -> Result<Backoff, String> {
    match s.to_lowercase().as_str() {
        "fixed" => Ok(Backoff::Fixed),
        "exponential" | "exp" => Ok(Backoff::Exponential { max }),
        _ => Err(format!(
            "Invalid backoff value: '{}'. Use fixed or exponential.",
            s
        )),
    }
}

/// Merge flags over config over defaults and validate the crawl range.
pub fn resolve_settings(args: &Args, config: Option<&Config>) -> Result<Settings, CliRunError> {
    let last_page = config
        .and_then(|c| c.last_page)
        .unwrap_or(DEFAULT_LAST_PAGE);
    let target = match args.start_id {
        Some(start) => CrawlTarget::Ids(CrawlRange::ids(start, args.end_id.unwrap_or(start))?),
        None => CrawlTarget::Pages(CrawlRange::pages(
            args.start_page,
            args.end_page.unwrap_or(args.start_page),
            last_page,
        )?),
    };

    let base_url = args
        .base_url
        .clone()
        .or_else(|| config.and_then(|c| c.base_url.clone()))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let category = args
        .category
        .or_else(|| config.and_then(|c| c.category))
        .unwrap_or(DEFAULT_CATEGORY);
    let catalog = Catalog::new(&base_url, category)
        .map_err(|e| CliRunError::InvalidInput(format!("Invalid base URL: {}", e)))?;

    let dest = args
        .dest_folder
        .clone()
        .or_else(|| config.and_then(|c| c.dest_folder.clone()))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DEST_FOLDER));
    let timeout_secs = args
        .timeout
        .or_else(|| config.and_then(|c| c.timeout_secs))
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let delay_secs = config
        .and_then(|c| c.request_delay_secs)
        .unwrap_or(DEFAULT_DELAY_SECS);

    let max_backoff = Duration::from_secs(
        config
            .and_then(|c| c.max_backoff_secs)
            .unwrap_or(DEFAULT_MAX_BACKOFF_SECS),
    );
    let backoff = match config.and_then(|c| c.backoff.as_deref()) {
        Some(s) => parse_backoff(s, max_backoff).map_err(CliRunError::InvalidInput)?,
        None => Backoff::Fixed,
    };
    let retry = RetryPolicy {
        backoff,
        base_delay: Duration::from_secs(
            config
                .and_then(|c| c.retry_backoff_secs)
                .unwrap_or(DEFAULT_RETRY_BACKOFF_SECS),
        ),
        max_attempts: None,
    }
    .with_max_attempts(args.max_attempts.or_else(|| config.and_then(|c| c.max_attempts)));

    Ok(Settings {
        target,
        catalog,
        download: DownloadOptions {
            dest,
            skip_images: args.skip_imgs,
            skip_text: args.skip_txt,
        },
        timeout: Duration::from_secs(timeout_secs),
        delay_secs,
        user_agent: args
            .user_agent
            .clone()
            .or_else(|| config.and_then(|c| c.user_agent.clone())),
        retry,
        log_file: args
            .log_file
            .clone()
            .or_else(|| config.and_then(|c| c.log_file.clone())),
    })
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let config = config::load_config().map_err(CliRunError::InvalidInput)?;
    let settings = resolve_settings(args, config.as_ref())?;

    logging::init(args.verbose, settings.log_file.as_deref())
        .map_err(|e| CliRunError::InvalidInput(format!("{:#}", e)))?;
    tracing::debug!(?settings, "resolved settings");

    let mut builder = PoliteClient::builder()
        .timeout_secs(settings.timeout.as_secs())
        .delay_secs(settings.delay_secs);
    if let Some(ua) = settings.user_agent.clone() {
        builder = builder.user_agent(ua);
    }
    let mut client = builder
        .build()
        .map_err(|e| CliRunError::InvalidInput(format!("Failed to create HTTP client: {}", e)))?;

    let diag = TracingDiagnostics;
    let mut session = Session {
        client: &mut client,
        catalog: &settings.catalog,
        timeout: settings.timeout,
        retry: &settings.retry,
        diag: &diag,
    };

    let ids: Vec<u32> = match settings.target {
        CrawlTarget::Ids(range) => range.iter().collect(),
        CrawlTarget::Pages(range) => {
            let bar = if args.quiet {
                indicatif::ProgressBar::hidden()
            } else {
                indicatif::ProgressBar::new(range.count() as u64)
            };
            if let Ok(style) = indicatif::ProgressStyle::default_bar()
                .template("{spinner} {msg} [{bar:40}] {pos}/{len} ({elapsed})")
            {
                bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏ "));
            }
            let progress: &dyn Fn(u32, u32) = &|n, total| {
                bar.set_position(n as u64);
                bar.set_message(format!("Listing page {}/{}", n, total));
            };
            let ids = discover(&mut session, range, Some(progress));
            bar.finish_and_clear();
            ids
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = pipeline::run(&mut session, &ids, &settings.download, &mut out);
    let manifest_path = summary.manifest.flush(&settings.download.dest)?;

    if !args.quiet {
        eprintln!(
            "Downloaded {} book(s), skipped {}. Wrote {}",
            summary.manifest.len(),
            summary.skipped.len(),
            manifest_path.display()
        );
    }
    Ok(())
}
