//! Bounded-concurrency driver: takes positions from the cursor, filters them
//! through the job shard, keeps up to `concurrency` retrying fetches in
//! flight, and hands results to the consumer under channel backpressure.
//!
//! This task is the only writer of cursor and stats. Fetch tasks see nothing
//! but their own `TileCoord`.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::ScanError;
use crate::job::{belongs_to_job, JobShard};
use crate::retry::{fetch_with_retry, FetchOutcome, RetryPolicy};
use crate::source::{Tile, TileCoord, TileSource};
use crate::stats::ScanStats;

use super::cursor::Cursor;
use super::ScanItem;

pub(crate) type ItemSender = mpsc::Sender<Result<ScanItem, ScanError>>;

/// Where the producer sends items and length notifications.
pub(crate) struct Outlet {
    pub tx: ItemSender,
    pub length_tx: broadcast::Sender<u64>,
    pub cancel: CancellationToken,
}

impl Outlet {
    /// Deliver one item. False if the consumer is gone or the scan was aborted.
    pub async fn deliver(&self, item: Result<ScanItem, ScanError>) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.tx.send(item) => sent.is_ok(),
        }
    }

    /// Announce the remaining-length estimate. Nobody listening is fine; a
    /// listener that falls behind loses the oldest values.
    pub fn announce_length(&self, length: u64) {
        let _ = self.length_tx.send(length);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }
}

type FetchResult = (TileCoord, Result<FetchOutcome, ScanError>);

pub(crate) struct Controller<S> {
    source: Arc<S>,
    cursor: Cursor,
    job: Option<JobShard>,
    policy: RetryPolicy,
    concurrency: usize,
    stats: Arc<ScanStats>,
    outlet: Outlet,
    in_flight: JoinSet<FetchResult>,
}

impl<S: TileSource> Controller<S> {
    pub fn new(
        source: Arc<S>,
        cursor: Cursor,
        job: Option<JobShard>,
        policy: RetryPolicy,
        concurrency: usize,
        stats: Arc<ScanStats>,
        outlet: Outlet,
    ) -> Self {
        Self {
            source,
            cursor,
            job,
            policy,
            concurrency: concurrency.max(1),
            stats,
            outlet,
            in_flight: JoinSet::new(),
        }
    }

    /// Run until the cursor is exhausted and nothing is in flight, a fatal
    /// error is delivered, or the scan is aborted. Dropping the sender at the
    /// end is the end-of-stream signal.
    pub async fn run(mut self) {
        loop {
            self.dispatch();

            let waiting_on_consumer = self.waiting_on_consumer();
            if self.in_flight.is_empty() {
                if self.cursor.is_exhausted() || self.outlet.is_cancelled() {
                    break;
                }
                // Nothing in flight and the consumer is full: wait for room.
                tokio::select! {
                    biased;
                    _ = self.outlet.cancel.cancelled() => break,
                    permit = self.outlet.tx.reserve() => match permit {
                        Ok(permit) => drop(permit),
                        Err(_) => break,
                    },
                }
                continue;
            }

            let joined = tokio::select! {
                biased;
                _ = self.outlet.cancel.cancelled() => break,
                joined = self.in_flight.join_next() => joined,
                permit = self.outlet.tx.reserve(), if waiting_on_consumer => {
                    match permit {
                        Ok(permit) => drop(permit),
                        Err(_) => break,
                    }
                    continue;
                }
            };
            let Some(joined) = joined else {
                continue;
            };

            match joined {
                Ok((coord, Ok(FetchOutcome::Tile(data)))) => {
                    self.stats.record_done();
                    let tile = Tile::new(coord, data);
                    if !self.outlet.deliver(Ok(ScanItem::Tile(tile))).await {
                        break;
                    }
                }
                Ok((coord, Ok(FetchOutcome::Absent))) => self.skip(coord),
                Ok((coord, Err(err))) => {
                    tracing::warn!(%coord, error = %err, "tile fetch failed, aborting scan");
                    self.outlet.deliver(Err(err)).await;
                    break;
                }
                Err(join_err) => {
                    tracing::warn!(error = %join_err, "fetch task failed, aborting scan");
                    self.outlet
                        .deliver(Err(ScanError::Task(join_err.to_string())))
                        .await;
                    break;
                }
            }
        }

        self.in_flight.abort_all();
        let stats = self.stats.snapshot();
        tracing::info!(
            ops = stats.ops,
            total = stats.total,
            skipped = stats.skipped,
            done = stats.done,
            "scan finished"
        );
    }

    /// Start fetches until the budget is used, the cursor runs out, or the
    /// consumer has no room. Rejected positions are skipped in this loop.
    fn dispatch(&mut self) {
        while self.in_flight.len() < self.concurrency
            && !self.outlet.is_cancelled()
            && self.outlet.tx.capacity() > 0
        {
            let Some(coord) = self.cursor.advance() else {
                break;
            };
            self.stats.record_op();

            if !belongs_to_job(coord.x, self.job.as_ref()) {
                self.skip(coord);
                continue;
            }

            let source = Arc::clone(&self.source);
            let policy = self.policy;
            tracing::trace!(%coord, "dispatch");
            self.in_flight.spawn(async move {
                let res = fetch_with_retry(source.as_ref(), coord, &policy).await;
                (coord, res)
            });
        }
    }

    /// True when more fetches could start but the output channel is full.
    fn waiting_on_consumer(&self) -> bool {
        self.in_flight.len() < self.concurrency
            && !self.cursor.is_exhausted()
            && self.outlet.tx.capacity() == 0
    }

    fn skip(&self, coord: TileCoord) {
        let length = self.stats.record_skip();
        tracing::trace!(%coord, length, "skip");
        self.outlet.announce_length(length);
    }
}
