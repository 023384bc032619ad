use crate::domain::tiling::TileKey;
use crate::domain::webcam::{TileRepository, WebcamError, WebcamId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// メモリ上のタイル保存先（テストと `--dry-run` 用）
#[derive(Debug, Clone, Default)]
pub struct InMemoryTileRepository {
    tiles: Arc<RwLock<HashMap<(WebcamId, TileKey), Vec<u8>>>>,
    raws: Arc<RwLock<HashMap<WebcamId, Vec<u8>>>>,
}

impl InMemoryTileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn tile(&self, id: &WebcamId, key: TileKey) -> Option<Vec<u8>> {
        self.tiles.read().await.get(&(id.clone(), key)).cloned()
    }

    pub async fn raw(&self, id: &WebcamId) -> Option<Vec<u8>> {
        self.raws.read().await.get(id).cloned()
    }

    pub async fn tile_count(&self, id: &WebcamId) -> usize {
        self.tiles
            .read()
            .await
            .keys()
            .filter(|(owner, _)| owner == id)
            .count()
    }
}

#[async_trait]
impl TileRepository for InMemoryTileRepository {
    async fn put_tile(
        &self,
        id: &WebcamId,
        key: TileKey,
        bytes: Vec<u8>,
    ) -> Result<(), WebcamError> {
        self.tiles.write().await.insert((id.clone(), key), bytes);
        Ok(())
    }

    async fn put_raw(&self, id: &WebcamId, bytes: Vec<u8>) -> Result<(), WebcamError> {
        self.raws.write().await.insert(id.clone(), bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_round_trip_without_runtime() {
        let repository = InMemoryTileRepository::new();
        let id = WebcamId::new("cam");
        tokio_test::block_on(async {
            tokio_test::assert_ok!(repository.put_raw(&id, vec![4, 2]).await);
            assert_eq!(repository.raw(&id).await, Some(vec![4, 2]));
        });
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let repository = InMemoryTileRepository::new();
        let id = WebcamId::new("cam");
        let key = TileKey::preview();

        repository.put_tile(&id, key, vec![1]).await.unwrap();
        repository.put_tile(&id, key, vec![2]).await.unwrap();
        repository.put_tile(&WebcamId::new("other"), key, vec![3]).await.unwrap();

        assert_eq!(repository.tile(&id, key).await, Some(vec![2]));
        assert_eq!(repository.tile_count(&id).await, 1);
        assert!(repository.raw(&id).await.is_none());
    }
}
