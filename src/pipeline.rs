//! Per-book download pipeline: detail page, text, cover image, manifest entry.
//!
//! Each id is processed on its own. A missing or broken book is logged and skipped;
//! it never stops the run.

use crate::manifest::{write_file, Manifest, PersistError};
use crate::model::BookRecord;
use crate::paths::{book_text_path, image_path};
use crate::scraper::tululu::parse_detail_page;
use crate::scraper::{FetchError, ScraperError, Session};
use reqwest::Url;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Where to write and which assets to skip.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub dest: PathBuf,
    pub skip_images: bool,
    pub skip_text: bool,
}

/// Why one book was skipped.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Scraper(#[from] ScraperError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl From<FetchError> for ItemError {
    fn from(e: FetchError) -> Self {
        ItemError::Scraper(ScraperError::Fetch(e))
    }
}

impl ItemError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ItemError::Scraper(e) if e.is_not_found())
    }
}

#[derive(Debug)]
pub enum ProcessOutcome {
    Downloaded(BookRecord),
    Skipped { id: u32, error: ItemError },
}

/// Result of processing a list of ids.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub manifest: Manifest,
    pub skipped: Vec<(u32, ItemError)>,
}

/// Download one book. Text is written before the cover; a cover failure keeps the text
/// and leaves `local_image_path` empty.
pub fn process(session: &mut Session<'_>, id: u32, options: &DownloadOptions) -> ProcessOutcome {
    session
        .diag
        .debug(&format!("Trying to download book with ID {}", id));
    let book = match fetch_book(session, id, options) {
        Ok(book) => book,
        Err(error) => {
            if error.is_not_found() {
                session
                    .diag
                    .error(&format!("Book with ID {} is not found: {}", id, error));
            } else {
                session
                    .diag
                    .error(&format!("Book with ID {} skipped: {}", id, error));
            }
            return ProcessOutcome::Skipped { id, error };
        }
    };

    let local_image = if options.skip_images {
        None
    } else {
        match download_image(session, &book, options) {
            Ok(path) => Some(path),
            Err(e) => {
                session
                    .diag
                    .error(&format!("Cover of book {} not saved: {}", id, e));
                None
            }
        }
    };

    session.diag.debug(&format!("Book {} was downloaded", id));
    ProcessOutcome::Downloaded(book.with_local_image(local_image))
}

/// Detail page and, unless skipped, the book text.
fn fetch_book(
    session: &mut Session<'_>,
    id: u32,
    options: &DownloadOptions,
) -> Result<BookRecord, ItemError> {
    let page_url = session.catalog.detail_url(id)?;
    let page = session.fetch(&page_url)?;
    let book = parse_detail_page(id, &String::from_utf8_lossy(&page.body), &page.final_url)?;

    if !options.skip_text {
        let text_url = session.catalog.text_url(id)?;
        let text = session.fetch(&text_url)?;
        let path = book_text_path(&options.dest, id, &book.name);
        write_file(&path, &text.body)?;
        session
            .diag
            .debug(&format!("Saved text of book {} to {}", id, path.display()));
    }
    Ok(book)
}

fn download_image(
    session: &mut Session<'_>,
    book: &BookRecord,
    options: &DownloadOptions,
) -> Result<PathBuf, ItemError> {
    let url = Url::parse(&book.image_url).map_err(|e| FetchError::InvalidUrl {
        input: book.image_url.clone(),
        reason: e.to_string(),
    })?;
    let path = image_path(&options.dest, &url).ok_or_else(|| FetchError::InvalidUrl {
        input: book.image_url.clone(),
        reason: "URL path has no file name".to_string(),
    })?;
    let image = session.fetch(&url)?;
    write_file(&path, &image.body)?;
    Ok(path)
}

/// Process every id in order, printing `Name:`/`Author:` to `out` for each saved book.
pub fn run(
    session: &mut Session<'_>,
    ids: &[u32],
    options: &DownloadOptions,
    out: &mut dyn Write,
) -> RunSummary {
    let mut summary = RunSummary::default();
    for &id in ids {
        match process(session, id, options) {
            ProcessOutcome::Downloaded(book) => {
                if let Err(e) = writeln!(out, "Name: {}\nAuthor: {}\n", book.name, book.author) {
                    session
                        .diag
                        .error(&format!("Could not write progress output: {}", e));
                }
                summary.manifest.push(book);
            }
            ProcessOutcome::Skipped { id, error } => summary.skipped.push((id, error)),
        }
    }
    summary
}
