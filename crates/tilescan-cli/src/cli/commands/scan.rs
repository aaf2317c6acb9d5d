//! `tilescan scan` – enumerate a tile directory and print the tiles found.

use anyhow::Result;
use std::io::{self, BufWriter, Write};
use std::sync::Arc;
use std::time::Duration;
use tilescan_core::config::TilescanConfig;
use tilescan_core::source::dir::DirSource;
use tilescan_core::stats::{ScanStats, StatsSnapshot};
use tilescan_core::{ProjectedScheme, ScanItem, ScanOptions};
use tokio::task::JoinHandle;

use super::tilegrid_input;
use crate::cli::ScanArgs;

const PROGRESS_INTERVAL_MS: u64 = 500;

/// Flags first, then config values for whatever was left unset.
pub(crate) fn scan_options(cfg: &TilescanConfig, args: &ScanArgs) -> Result<ScanOptions> {
    let options = ScanOptions {
        tilegrid: Some(tilegrid_input(&args.range.tilegrid)?),
        bounds: args.range.bounds,
        minzoom: args.range.minzoom,
        maxzoom: args.range.maxzoom,
        concurrency: args.concurrency,
        metatile: None,
        job: args.job,
        retry: args.retry,
        retry_backoff_ms: args.retry_backoff_ms,
    };
    Ok(options.with_config_defaults(cfg))
}

pub async fn run_scan(cfg: &TilescanConfig, args: &ScanArgs) -> Result<()> {
    let options = scan_options(cfg, args)?;
    let source = DirSource::new(&args.source).with_extension(args.ext.as_str());
    let scheme = ProjectedScheme::new(source, options)?;
    tracing::info!(
        source = %args.source.display(),
        concurrency = scheme.concurrency(),
        job = ?scheme.job(),
        "starting scan"
    );

    let mut stream = scheme.stream();
    let progress = args.progress.then(|| spawn_progress(stream.stats_handle()));

    let mut out = BufWriter::new(io::stdout());
    let result = async {
        while let Some(item) = stream.next().await {
            match item? {
                ScanItem::Info(info) => {
                    tracing::debug!(name = ?info.name, minzoom = ?info.minzoom, maxzoom = ?info.maxzoom, "source info");
                }
                ScanItem::Tile(tile) => writeln!(out, "{}", tile.coord)?,
            }
        }
        out.flush()?;
        anyhow::Ok(())
    }
    .await;

    if let Some(handle) = progress {
        handle.abort();
        eprintln!();
    }
    let stats = stream.stats();
    eprintln!("{}", summary(&stats));
    result
}

fn summary(stats: &StatsSnapshot) -> String {
    format!(
        "ops={} total={} skipped={} done={} tiles={}",
        stats.ops,
        stats.total,
        stats.skipped,
        stats.done,
        stats.done.saturating_sub(stats.skipped)
    )
}

fn spawn_progress(stats: Arc<ScanStats>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_millis(PROGRESS_INTERVAL_MS));
        loop {
            tick.tick().await;
            let s = stats.snapshot();
            eprint!(
                "\r  {} / {} positions ({:.1}%)  {} skipped  ~{} tiles  ",
                s.done,
                s.total,
                s.fraction() * 100.0,
                s.skipped,
                s.length()
            );
        }
    })
}
