//! Projected tile scheme: enumerates every tile of a non-Mercator grid over
//! a region and zoom range, fetching each from a [`TileSource`].
//!
//! Pipeline: options validation → source metadata → per-zoom boxes →
//! cursor + job shard → bounded concurrent fetches → [`TileStream`].

mod controller;
pub mod cursor;
pub mod params;
mod stream;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::config::{TilescanConfig, DEFAULT_CONCURRENCY};
use crate::error::ScanError;
use crate::grid::{zoom_boxes, GeoBounds, TileGrid, TileGridInput};
use crate::job::JobShard;
use crate::retry::{RetryPolicy, DEFAULT_BACKOFF};
use crate::source::{SourceInfo, Tile, TileSource};
use crate::stats::ScanStats;

use controller::{Controller, Outlet};
use cursor::Cursor;
use params::{resolve, ExplicitParams};

pub use stream::{TileStream, LENGTH_EVENT_CAPACITY};

/// One item of the output sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanItem {
    /// Source metadata; always first.
    Info(SourceInfo),
    Tile(Tile),
}

impl ScanItem {
    pub fn into_tile(self) -> Option<Tile> {
        match self {
            ScanItem::Tile(tile) => Some(tile),
            ScanItem::Info(_) => None,
        }
    }
}

/// Options for one scan. Unset values fall back to the source's metadata
/// (zooms, bounds) or to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Required. Inline grid or its JSON encoding.
    #[serde(default)]
    pub tilegrid: Option<TileGridInput>,
    #[serde(default, alias = "bbox")]
    pub bounds: Option<GeoBounds>,
    #[serde(default)]
    pub minzoom: Option<u8>,
    #[serde(default)]
    pub maxzoom: Option<u8>,
    /// Fetches in flight (default 8).
    #[serde(default)]
    pub concurrency: Option<usize>,
    /// Reserved; validated and logged only (default 1).
    #[serde(default)]
    pub metatile: Option<u32>,
    #[serde(default)]
    pub job: Option<JobShard>,
    /// Retries per tile (default 0).
    #[serde(default)]
    pub retry: Option<u32>,
    /// Delay before each retry (default 1000 ms).
    #[serde(default)]
    pub retry_backoff_ms: Option<u64>,
}

impl ScanOptions {
    /// Fill unset run settings from the config file values.
    pub fn with_config_defaults(mut self, cfg: &TilescanConfig) -> Self {
        let retry = cfg.retry_or_default();
        self.concurrency.get_or_insert(cfg.concurrency);
        self.metatile.get_or_insert(cfg.metatile);
        self.retry.get_or_insert(retry.max_retries);
        self.retry_backoff_ms.get_or_insert(retry.backoff_ms);
        self
    }
}

/// Validated scan over one source. Build with [`ProjectedScheme::new`], run
/// with [`ProjectedScheme::stream`].
#[derive(Debug)]
pub struct ProjectedScheme<S> {
    source: Arc<S>,
    grid: Arc<TileGrid>,
    explicit: ExplicitParams,
    concurrency: usize,
    metatile: u32,
    job: Option<JobShard>,
    retry: RetryPolicy,
}

impl<S: TileSource> ProjectedScheme<S> {
    /// Validate options synchronously; no I/O happens here.
    pub fn new(source: S, options: ScanOptions) -> Result<Self, ScanError> {
        Self::with_shared_source(Arc::new(source), options)
    }

    pub fn with_shared_source(source: Arc<S>, options: ScanOptions) -> Result<Self, ScanError> {
        let input = options
            .tilegrid
            .as_ref()
            .ok_or_else(|| ScanError::config("not a tilegrid"))?;
        let grid = TileGrid::from_input(input)?;

        if let (Some(min), Some(max)) = (options.minzoom, options.maxzoom) {
            if min > max {
                return Err(ScanError::config("maxzoom must be >= minzoom"));
            }
        }
        for (name, z) in [("minzoom", options.minzoom), ("maxzoom", options.maxzoom)] {
            if z.is_some_and(|z| z > grid.max_zoom()) {
                return Err(ScanError::config(format!(
                    "{} must be <= {}",
                    name,
                    grid.max_zoom()
                )));
            }
        }

        if let Some(bounds) = options.bounds {
            if !bounds.is_finite() {
                return Err(ScanError::config(
                    "bounds must be an array of the form [w,s,e,n]",
                ));
            }
            if let Some(outer) = grid.bounds {
                bounds.check_within(&outer)?;
            }
            bounds.check_order()?;
        }

        let concurrency = options.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(ScanError::config("concurrency must be > 0"));
        }
        let metatile = options.metatile.unwrap_or(1);
        if metatile == 0 {
            return Err(ScanError::config("metatile must be > 0"));
        }
        if let Some(job) = &options.job {
            job.validate()?;
        }

        let retry = RetryPolicy::new(
            options.retry.unwrap_or(0),
            options
                .retry_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_BACKOFF),
        );

        Ok(Self {
            source,
            grid: Arc::new(grid),
            explicit: ExplicitParams {
                bounds: options.bounds,
                minzoom: options.minzoom,
                maxzoom: options.maxzoom,
            },
            concurrency,
            metatile,
            job: options.job,
            retry,
        })
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn metatile(&self) -> u32 {
        self.metatile
    }

    pub fn job(&self) -> Option<JobShard> {
        self.job
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Lazy output stream. The source is not contacted until the first
    /// [`TileStream::next`].
    pub fn stream(self) -> TileStream {
        let (tx, rx) = mpsc::channel(self.concurrency);
        let (length_tx, length_rx) = broadcast::channel(LENGTH_EVENT_CAPACITY);
        let stats = Arc::new(ScanStats::new());
        let cancel = CancellationToken::new();
        let outlet = Outlet {
            tx,
            length_tx,
            cancel: cancel.clone(),
        };
        let producer = Box::pin(self.produce(outlet, Arc::clone(&stats)));
        TileStream::new(rx, producer, length_rx, stats, cancel)
    }

    async fn produce(self, outlet: Outlet, stats: Arc<ScanStats>) {
        let info = tokio::select! {
            biased;
            _ = outlet.cancel.cancelled() => return,
            info = self.source.get_info() => info,
        };
        let info = match info {
            Ok(info) => info,
            Err(e) => {
                outlet.deliver(Err(ScanError::Info(e))).await;
                return;
            }
        };

        let boxes = match resolve(&self.explicit, &self.grid, &info).and_then(|p| {
            tracing::info!(
                srid = self.grid.srid,
                minzoom = p.minzoom,
                maxzoom = p.maxzoom,
                bounds = %p.bounds,
                concurrency = self.concurrency,
                metatile = self.metatile,
                job = ?self.job,
                "scan starting"
            );
            zoom_boxes(&self.grid, p.minzoom, p.maxzoom, &p.bounds)
        }) {
            Ok(boxes) => boxes,
            Err(e) => {
                tracing::warn!(error = %e, "scan parameters rejected");
                outlet.deliver(Err(e)).await;
                return;
            }
        };

        for (z, bbox) in boxes.iter() {
            tracing::debug!(z, ?bbox, cells = bbox.area(), "zoom box");
        }
        let total = boxes.total();
        stats.set_total(total);
        outlet.announce_length(total);

        if !outlet.deliver(Ok(ScanItem::Info(info))).await {
            return;
        }

        Controller::new(
            self.source,
            Cursor::new(boxes),
            self.job,
            self.retry,
            self.concurrency,
            stats,
            outlet,
        )
        .run()
        .await;
    }
}
