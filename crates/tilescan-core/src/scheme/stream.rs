//! Consumer side of a scan: a pull-based, bounded sequence of one
//! [`ScanItem::Info`] followed by tiles, plus the stats and length surfaces.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::ScanError;
use crate::stats::{ScanStats, StatsSnapshot};

use super::ScanItem;

/// Length notifications retained for a listener that is behind (or has not
/// taken the receiver yet). Older values are dropped first.
pub const LENGTH_EVENT_CAPACITY: usize = 256;

pub(crate) type Producer = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Output of [`super::ProjectedScheme::stream`].
///
/// Nothing happens until the first call to [`TileStream::next`]: that call
/// spawns the producer, which asks the source for its metadata. The channel
/// capacity is the consumer's credit; when it is used up no new fetches are
/// started. Dropping the stream aborts the scan.
pub struct TileStream {
    rx: mpsc::Receiver<Result<ScanItem, ScanError>>,
    producer: Option<Producer>,
    task: Option<JoinHandle<()>>,
    length_rx: Option<broadcast::Receiver<u64>>,
    stats: Arc<ScanStats>,
    cancel: CancellationToken,
}

impl TileStream {
    pub(crate) fn new(
        rx: mpsc::Receiver<Result<ScanItem, ScanError>>,
        producer: Producer,
        length_rx: broadcast::Receiver<u64>,
        stats: Arc<ScanStats>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            rx,
            producer: Some(producer),
            task: None,
            length_rx: Some(length_rx),
            stats,
            cancel,
        }
    }

    /// Next item, or `None` at end of stream or after [`TileStream::abort`].
    /// An `Err` is always the last item.
    pub async fn next(&mut self) -> Option<Result<ScanItem, ScanError>> {
        if self.cancel.is_cancelled() {
            return None;
        }
        if let Some(producer) = self.producer.take() {
            self.task = Some(tokio::spawn(producer));
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            item = self.rx.recv() => item,
        }
    }

    /// Remaining-length notifications: one when the boxes are computed, then
    /// one per skipped position. At most [`LENGTH_EVENT_CAPACITY`] are kept;
    /// a slow listener sees `RecvError::Lagged` and then the newest values.
    /// Can be taken once.
    pub fn take_length_events(&mut self) -> Option<broadcast::Receiver<u64>> {
        self.length_rx.take()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Shared counters, for progress reporting from another task.
    pub fn stats_handle(&self) -> Arc<ScanStats> {
        Arc::clone(&self.stats)
    }

    /// Current remaining-length estimate (`total - skipped`).
    pub fn length(&self) -> u64 {
        self.stats.length()
    }

    /// Stop dispatching new fetches; no further items are returned.
    pub fn abort(&self) {
        self.cancel.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for the producer task to wind down (after end of stream or abort).
    /// A panic in the producer is re-raised here.
    pub async fn join(mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        match task.await {
            Ok(()) => {}
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => tracing::warn!(error = %err, "scan producer did not finish"),
        }
    }
}

impl Drop for TileStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
