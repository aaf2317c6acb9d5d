use std::time::Duration;

use crate::config::RetryConfig;

/// Backoff used when nothing else is configured.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Classification of a source error for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The tile does not exist. Never retried, never an error.
    Absent,
    /// Anything else; retried while the budget lasts.
    Transient,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Fixed-delay retry policy, owned by one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay before each retry.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            backoff: Duration::from_millis(cfg.backoff_ms),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Decide what to do after attempt number `attempt` (1 = first) failed.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        match kind {
            ErrorKind::Absent => RetryDecision::NoRetry,
            ErrorKind::Transient if attempt > self.max_retries => RetryDecision::NoRetry,
            ErrorKind::Transient => RetryDecision::RetryAfter(self.backoff),
        }
    }
}
