//! Fetch one tile, retrying transient failures per the policy.

use crate::error::ScanError;
use crate::retry::classify::classify;
use crate::retry::policy::{ErrorKind, RetryDecision, RetryPolicy};
use crate::source::{TileCoord, TileSource};

/// What a fetch produced once retries are settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Non-empty payload.
    Tile(Vec<u8>),
    /// Source reported absence or returned an empty payload.
    Absent,
}

/// Fetches `coord` until it succeeds, is absent, or the policy says to stop.
/// On a retryable failure, sleeps for the backoff then tries again.
pub async fn fetch_with_retry<S: TileSource>(
    source: &S,
    coord: TileCoord,
    policy: &RetryPolicy,
) -> Result<FetchOutcome, ScanError> {
    let mut attempt = 1u32;
    loop {
        let err = match source.get_tile(coord).await {
            Ok(data) if data.is_empty() => return Ok(FetchOutcome::Absent),
            Ok(data) => return Ok(FetchOutcome::Tile(data)),
            Err(e) => e,
        };
        let kind = classify(&err);
        if kind == ErrorKind::Absent {
            return Ok(FetchOutcome::Absent);
        }
        match policy.decide(attempt, kind) {
            RetryDecision::NoRetry => {
                return Err(ScanError::Fetch {
                    coord,
                    source: err,
                })
            }
            RetryDecision::RetryAfter(d) => {
                tracing::warn!(%coord, attempt, error = %err, "tile fetch failed, retrying");
                tokio::time::sleep(d).await;
                attempt += 1;
            }
        }
    }
}
