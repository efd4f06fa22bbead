//! Blocking HTTP client that classifies each GET into a [FetchOutcome].
//!
//! Redirects are never followed: the catalog answers unknown or removed ids with a
//! redirect to a generic page, so a 3xx response is reported as [FetchOutcome::NotFound].
//! Retrying is left to the caller (see [crate::scraper::retry]).

use reqwest::Url;
use std::time::{Duration, Instant};

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; tululu/0.1; +https://github.com/tululu-books)";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DELAY_SECS: u64 = 0;

/// Result of a single GET.
#[derive(Debug)]
pub enum FetchOutcome {
    Success { body: Vec<u8>, final_url: Url },
    /// Response was a redirect away from the requested resource.
    NotFound,
    /// Connection failure, timeout, or a non-2xx status that was not a redirect.
    TransportError {
        retryable: bool,
        status: Option<u16>,
        reason: String,
    },
}

impl FetchOutcome {
    fn from_error(e: reqwest::Error) -> Self {
        let retryable = e.is_timeout() || e.is_connect() || e.is_body();
        FetchOutcome::TransportError {
            retryable,
            status: e.status().map(|s| s.as_u16()),
            reason: e.to_string(),
        }
    }
}

/// Blocking HTTP client that enforces an optional delay between requests.
#[derive(Debug)]
pub struct PoliteClient {
    inner: reqwest::blocking::Client,
    delay: Duration,
    timeout: Duration,
    last_request: Option<Instant>,
}

impl PoliteClient {
    /// Build a client with default User-Agent, 10 s timeout and no delay.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::builder().build()
    }

    pub fn builder() -> PoliteClientBuilder {
        PoliteClientBuilder::default()
    }

    /// Default per-request timeout configured on the builder.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issue one GET with the given timeout and classify the response. Never retries.
    pub fn fetch(&mut self, url: &Url, timeout: Duration) -> FetchOutcome {
        self.wait_delay();
        let sent = self.inner.get(url.clone()).timeout(timeout).send();
        self.last_request = Some(Instant::now());
        let response = match sent {
            Ok(r) => r,
            Err(e) => return FetchOutcome::from_error(e),
        };

        let status = response.status();
        if status.is_redirection() {
            return FetchOutcome::NotFound;
        }
        if !status.is_success() {
            return FetchOutcome::TransportError {
                retryable: false,
                status: Some(status.as_u16()),
                reason: format!("HTTP {}", status.as_u16()),
            };
        }

        let final_url = response.url().clone();
        match response.bytes() {
            Ok(body) => FetchOutcome::Success {
                body: body.to_vec(),
                final_url,
            },
            Err(e) => FetchOutcome::from_error(e),
        }
    }

    fn wait_delay(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                std::thread::sleep(self.delay - elapsed);
            }
        }
    }
}

/// Builder for PoliteClient with optional User-Agent, delay and timeout.
#[derive(Debug)]
pub struct PoliteClientBuilder {
    user_agent: Option<String>,
    delay_secs: u64,
    timeout_secs: u64,
}

impl Default for PoliteClientBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            delay_secs: DEFAULT_DELAY_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl PoliteClientBuilder {
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set delay between requests in seconds. Default 0.
    pub fn delay_secs(mut self, secs: u64) -> Self {
        self.delay_secs = secs;
        self
    }

    /// Set request timeout in seconds. Default 10.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<PoliteClient, reqwest::Error> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let timeout = Duration::from_secs(self.timeout_secs);
        let inner = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(PoliteClient {
            inner,
            delay: Duration::from_secs(self.delay_secs),
            timeout,
            last_request: None,
        })
    }
}
