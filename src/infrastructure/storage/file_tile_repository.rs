use crate::domain::tiling::{TileKey, raw_file_name};
use crate::domain::webcam::{TileRepository, WebcamError, WebcamId};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// `<ディレクトリ>/<id>_tile_<z>_<row>_<column>.jpg` に書き込む
///
/// 一時ファイルに書いてから名前を変えるので、読み手が書き込み途中のタイルを見ることはない
#[derive(Debug, Clone)]
pub struct FileTileRepository {
    directory: PathBuf,
}

impl FileTileRepository {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub async fn ensure_directory(&self) -> Result<(), WebcamError> {
        fs::create_dir_all(&self.directory).await.map_err(|e| {
            WebcamError::TileStorage(format!(
                "Failed to create {}: {e}",
                self.directory.display()
            ))
        })?;
        info!(directory = %self.directory.display(), "Tile directory ready");
        Ok(())
    }

    async fn write(&self, file_name: &str, bytes: &[u8]) -> Result<(), WebcamError> {
        let target = self.directory.join(file_name);
        let staging = self.directory.join(format!(".{file_name}.tmp"));

        fs::write(&staging, bytes).await.map_err(|e| {
            WebcamError::TileStorage(format!("Failed to write {}: {e}", staging.display()))
        })?;
        fs::rename(&staging, &target).await.map_err(|e| {
            WebcamError::TileStorage(format!("Failed to replace {}: {e}", target.display()))
        })?;

        debug!(path = %target.display(), bytes = bytes.len(), "Wrote tile");
        Ok(())
    }
}

#[async_trait]
impl TileRepository for FileTileRepository {
    async fn put_tile(
        &self,
        id: &WebcamId,
        key: TileKey,
        bytes: Vec<u8>,
    ) -> Result<(), WebcamError> {
        self.write(&key.file_name(id.as_str()), &bytes).await
    }

    async fn put_raw(&self, id: &WebcamId, bytes: Vec<u8>) -> Result<(), WebcamError> {
        self.write(&raw_file_name(id.as_str()), &bytes).await
    }
}
