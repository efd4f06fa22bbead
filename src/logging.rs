//! Logging setup and the diagnostics sink threaded through the crawl.
//!
//! `init` installs a `tracing` subscriber once at process start: errors go to stderr
//! (this crate's debug output with `--verbose`), and an optional log file receives this
//! crate's debug output as well.
//! Components never log through a global handle; they receive a `&dyn Diagnostics`.

use anyhow::Context as _;
use std::cell::RefCell;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{EnvFilter, Layer as _};

/// Console directive when `RUST_LOG` is unset. Verbose mode raises only this crate to
/// debug so HTTP stack internals stay quiet.
pub fn default_console_directive(verbose: bool) -> &'static str {
    if verbose {
        "error,tululu=debug"
    } else {
        "error"
    }
}

pub fn init(verbose: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_console_directive(verbose)))
        .context("build log filter")?;
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            let filter = EnvFilter::try_new(default_console_directive(true))
                .context("build log file filter")?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(filter),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}

/// Sink for crawl diagnostics. Discovery and the download pipeline report through this.
pub trait Diagnostics {
    fn debug(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards diagnostics to the installed `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Level of a recorded diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Debug,
    Error,
}

/// Keeps every message in memory. Used by tests and by embedders that want to inspect a run.
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    entries: RefCell<Vec<(DiagnosticLevel, String)>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(DiagnosticLevel, String)> {
        self.entries.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(level, _)| *level == DiagnosticLevel::Error)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn debug(&self, message: &str) {
        self.entries
            .borrow_mut()
            .push((DiagnosticLevel::Debug, message.to_string()));
    }

    fn error(&self, message: &str) {
        self.entries
            .borrow_mut()
            .push((DiagnosticLevel::Error, message.to_string()));
    }
}
