//! Caller-side retry loop around [PoliteClient::fetch].
//!
//! Retryable transport errors sleep and try the same URL again. The default policy
//! retries forever with a fixed 5 s pause; `max_attempts` turns exhaustion into a
//! permanent [FetchError::RetriesExhausted] for that item.

use crate::logging::Diagnostics;
use crate::scraper::client::{FetchOutcome, PoliteClient};
use crate::scraper::error::FetchError;
use reqwest::Url;
use std::time::Duration;

const DEFAULT_BACKOFF_SECS: u64 = 5;
/// Largest doubling step for exponential backoff (2^16 * base).
const MAX_EXPONENT: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same pause before every retry.
    Fixed,
    /// Pause doubles after each failed attempt, capped at `max`.
    Exponential { max: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub backoff: Backoff,
    pub base_delay: Duration,
    /// Total attempts including the first. `None` retries without limit.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: Backoff::Fixed,
            base_delay: Duration::from_secs(DEFAULT_BACKOFF_SECS),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            backoff: Backoff::Fixed,
            base_delay: delay,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_attempts = attempts.map(|n| n.max(1));
        self
    }

    /// Pause before retry number `retry` (1 for the first retry).
    pub fn delay_for(&self, retry: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Exponential { max } => {
                let exp = retry.saturating_sub(1).min(MAX_EXPONENT);
                self.base_delay.saturating_mul(1u32 << exp).min(max)
            }
        }
    }

    /// True when another attempt is allowed after `attempts` have failed.
    fn allows_another(&self, attempts: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts < max)
    }
}

/// Body and final URL of a successful fetch.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub body: Vec<u8>,
    pub final_url: Url,
}

/// Fetch `url`, retrying retryable transport errors according to `policy`.
pub fn fetch_with_retry(
    client: &mut PoliteClient,
    url: &Url,
    timeout: Duration,
    policy: &RetryPolicy,
    diag: &dyn Diagnostics,
) -> Result<Fetched, FetchError> {
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        diag.debug(&format!("GET {} (attempt {})", url, attempts));
        match client.fetch(url, timeout) {
            FetchOutcome::Success { body, final_url } => return Ok(Fetched { body, final_url }),
            FetchOutcome::NotFound => {
                return Err(FetchError::NotFound {
                    url: url.to_string(),
                })
            }
            FetchOutcome::TransportError {
                retryable: false,
                status: Some(status),
                ..
            } => {
                return Err(FetchError::HttpStatus {
                    status,
                    url: url.to_string(),
                })
            }
            FetchOutcome::TransportError {
                retryable: false,
                reason,
                ..
            } => {
                return Err(FetchError::Transport {
                    url: url.to_string(),
                    retryable: false,
                    reason,
                })
            }
            FetchOutcome::TransportError { reason, .. } => {
                if !policy.allows_another(attempts) {
                    diag.error(&format!("Connection error with {}: {}", url, reason));
                    return Err(FetchError::RetriesExhausted {
                        url: url.to_string(),
                        attempts,
                    });
                }
                let pause = policy.delay_for(attempts);
                diag.error(&format!(
                    "Connection error with {}: {}. Retrying in {:?}",
                    url, reason, pause
                ));
                std::thread::sleep(pause);
            }
        }
    }
}
