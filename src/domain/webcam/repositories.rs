use super::{CaptureError, SourceKind, WebcamError, WebcamId};
use crate::domain::tiling::{TileKey, TileSet};
use async_trait::async_trait;
use chrono::{DateTime, Local};

/// 取得元バックエンド
///
/// 1回の呼び出しでデバイスを開き、1フレームをエンコード済みバイト列として返し、
/// どの経路でもデバイスを解放してから戻る
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    fn kind(&self) -> SourceKind;
    async fn capture_once(&self) -> Result<Vec<u8>, CaptureError>;
}

/// タイルの保存先。同じキーへの書き込みは後勝ち
#[async_trait]
pub trait TileRepository: Send + Sync {
    async fn put_tile(&self, id: &WebcamId, key: TileKey, bytes: Vec<u8>)
    -> Result<(), WebcamError>;
    async fn put_raw(&self, id: &WebcamId, bytes: Vec<u8>) -> Result<(), WebcamError>;

    /// タイル一式を保存し、書き込んだタイル数を返す
    async fn store_tile_set(&self, id: &WebcamId, tile_set: TileSet) -> Result<usize, WebcamError> {
        let count = tile_set.tiles.len();
        self.put_raw(id, tile_set.raw).await?;
        for (key, bytes) in tile_set.tiles {
            self.put_tile(id, key, bytes).await?;
        }
        Ok(count)
    }
}

/// 現在時刻の提供元
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}
