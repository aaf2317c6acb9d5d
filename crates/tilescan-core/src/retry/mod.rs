//! Retry and backoff policy for tile fetches.
//!
//! This module classifies source errors (absent vs transient) and decides
//! whether a failed fetch is tried again, so the controller only ever sees
//! a tile, an absence, or a final failure.

mod classify;
mod policy;
mod run;

pub use classify::classify;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy, DEFAULT_BACKOFF};
pub use run::{fetch_with_retry, FetchOutcome};
