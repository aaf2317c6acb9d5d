//! In-memory tile sources for integration tests.
//!
//! `MemorySource` serves a fixed tile set with optional latency and a
//! number of failures per tile before success; it also tracks how many
//! fetches are in flight at once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tilescan_core::source::{SourceError, SourceInfo, TileCoord, TileSource};

#[derive(Default)]
pub struct MemorySource {
    pub info: SourceInfo,
    tiles: HashMap<TileCoord, Vec<u8>>,
    latency: Duration,
    /// Failures per tile before the real answer is returned.
    fail_first: usize,
    always_fail: bool,
    attempts: Mutex<HashMap<TileCoord, usize>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemorySource {
    pub fn new(info: SourceInfo) -> Self {
        Self {
            info,
            ..Self::default()
        }
    }

    pub fn with_tiles(mut self, tiles: impl IntoIterator<Item = (TileCoord, Vec<u8>)>) -> Self {
        self.tiles.extend(tiles);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    pub fn always_failing(mut self) -> Self {
        self.always_fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TileSource for MemorySource {
    async fn get_info(&self) -> Result<SourceInfo, SourceError> {
        Ok(self.info.clone())
    }

    async fn get_tile(&self, coord: TileCoord) -> Result<Vec<u8>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.always_fail {
            return Err(SourceError::Failed("Fatal".into()));
        }
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let n = attempts.entry(coord).or_insert(0);
            *n += 1;
            *n
        };
        if attempt <= self.fail_first {
            return Err(SourceError::Failed("Fatal".into()));
        }
        match self.tiles.get(&coord) {
            Some(data) => Ok(data.clone()),
            None => Err(SourceError::from_message("Tile does not exist")),
        }
    }
}

/// Source whose metadata fetch fails.
pub struct BrokenInfoSource;

impl TileSource for BrokenInfoSource {
    async fn get_info(&self) -> Result<SourceInfo, SourceError> {
        Err(SourceError::Failed("metadata unavailable".into()))
    }

    async fn get_tile(&self, _coord: TileCoord) -> Result<Vec<u8>, SourceError> {
        Err(SourceError::NotFound)
    }
}

/// Source whose metadata backend panics.
pub struct PanickingInfoSource;

impl TileSource for PanickingInfoSource {
    async fn get_info(&self) -> Result<SourceInfo, SourceError> {
        panic!("metadata backend crashed")
    }

    async fn get_tile(&self, _coord: TileCoord) -> Result<Vec<u8>, SourceError> {
        Err(SourceError::NotFound)
    }
}
