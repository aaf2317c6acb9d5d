//! Tile source over a `{root}/{z}/{x}/{y}.{ext}` directory tree.
//!
//! Metadata comes from `{root}/metadata.json` when present; a tree without
//! it reports empty metadata and the scan must be given zooms and bounds.

use std::path::{Path, PathBuf};

use super::{SourceError, SourceInfo, TileCoord, TileSource};

pub const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
    extension: String,
}

impl DirSource {
    /// Source over `root` serving `.png` tiles.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: "png".to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tile_path(&self, coord: TileCoord) -> PathBuf {
        self.root
            .join(coord.z.to_string())
            .join(coord.x.to_string())
            .join(format!("{}.{}", coord.y, self.extension))
    }
}

impl TileSource for DirSource {
    async fn get_info(&self) -> Result<SourceInfo, SourceError> {
        let path = self.root.join(METADATA_FILE);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no metadata file, reporting empty info");
                return Ok(SourceInfo::default());
            }
            Err(e) => return Err(SourceError::Failed(format!("{}: {}", path.display(), e))),
        };
        serde_json::from_slice(&data)
            .map_err(|e| SourceError::Failed(format!("{}: {}", path.display(), e)))
    }

    async fn get_tile(&self, coord: TileCoord) -> Result<Vec<u8>, SourceError> {
        Ok(tokio::fs::read(self.tile_path(coord)).await?)
    }
}
