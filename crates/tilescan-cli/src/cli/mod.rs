//! CLI for the tilescan tile-pyramid enumerator.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tilescan_core::config;
use tilescan_core::grid::GeoBounds;
use tilescan_core::job::JobShard;

use commands::{run_plan, run_scan};

/// Top-level CLI for tilescan.
#[derive(Debug, Parser)]
#[command(name = "tilescan")]
#[command(about = "tilescan: enumerate a projected tile pyramid from a tile source", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Grid, region and zoom range shared by `scan` and `plan`.
#[derive(Debug, Clone, Args)]
pub struct RangeArgs {
    /// Tile grid as a JSON object, or a path to a JSON file holding one.
    #[arg(long, value_name = "GRID")]
    pub tilegrid: String,
    /// Region in grid units. Defaults to the source's bounds, then the grid's.
    #[arg(long, value_name = "W,S,E,N", allow_hyphen_values = true)]
    pub bounds: Option<GeoBounds>,
    /// First zoom. Defaults to the source's minzoom.
    #[arg(long)]
    pub minzoom: Option<u8>,
    /// Last zoom. Defaults to the source's maxzoom.
    #[arg(long)]
    pub maxzoom: Option<u8>,
}

/// Options of `tilescan scan`.
#[derive(Debug, Clone, Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub range: RangeArgs,
    /// Tile directory laid out as {z}/{x}/{y}.{ext}.
    #[arg(long, value_name = "DIR")]
    pub source: PathBuf,
    /// Tile file extension.
    #[arg(long, default_value = "png")]
    pub ext: String,
    /// Fetches in flight (default from config).
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,
    /// Only handle columns of this shard, given as num/total.
    #[arg(long, value_name = "NUM/TOTAL")]
    pub job: Option<JobShard>,
    /// Retries per tile after a failed fetch (default from config).
    #[arg(long, value_name = "N")]
    pub retry: Option<u32>,
    /// Delay before each retry in milliseconds (default from config).
    #[arg(long, value_name = "MS")]
    pub retry_backoff_ms: Option<u64>,
    /// Print progress to stderr while scanning.
    #[arg(long)]
    pub progress: bool,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch every tile in range and print `z/x/y` for each one found.
    Scan(ScanArgs),

    /// Print the per-zoom tile boxes and the total without fetching anything.
    Plan {
        #[command(flatten)]
        range: RangeArgs,
        /// Tile directory whose metadata.json fills in unset zooms and bounds.
        #[arg(long, value_name = "DIR")]
        source: Option<PathBuf>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Scan(args) => run_scan(&cfg, &args).await?,
            CliCommand::Plan { range, source } => run_plan(&range, source.as_deref()).await?,
        }

        Ok(())
    }
}
