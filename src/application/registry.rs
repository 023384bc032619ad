//! 設定済みウェブカメラの管理
//!
//! ウェブカメラごとにエンティティを非同期 Mutex で保護し、同じカメラの更新を直列化する。
//! 異なるカメラの更新は並行に実行できる

use super::use_cases::{UpdateReport, UpdateWebcamUseCase};
use crate::config::AppConfig;
use crate::domain::webcam::{
    CaptureBackend, Clock, TileRepository, Webcam, WebcamError, WebcamId, WebcamSnapshot,
};
use crate::infrastructure::capture::backend_for;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, instrument, warn};

struct WebcamEntry {
    webcam: Mutex<Webcam>,
    backend: Arc<dyn CaptureBackend>,
}

pub struct WebcamRegistry {
    entries: BTreeMap<WebcamId, Arc<WebcamEntry>>,
    use_case: Arc<UpdateWebcamUseCase>,
    tile_location: String,
}

impl WebcamRegistry {
    pub fn new(use_case: UpdateWebcamUseCase, tile_location: impl Into<String>) -> Self {
        Self {
            entries: BTreeMap::new(),
            use_case: Arc::new(use_case),
            tile_location: tile_location.into(),
        }
    }

    /// 設定ファイルの内容から構築する。バックエンドはここで一度だけ選択する
    pub fn from_config(
        config: &AppConfig,
        repository: Arc<dyn TileRepository>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, WebcamError> {
        let settings = &config.settings;
        let use_case = UpdateWebcamUseCase::from_settings(settings, repository, clock);
        let mut registry = Self::new(use_case, settings.tile_location.clone());

        for definition in &config.webcams {
            let webcam = Webcam::new(
                definition.id.as_deref().map(WebcamId::from),
                definition.location.as_str(),
                definition.name.as_str(),
                definition.rotation,
            )?;
            let backend = backend_for(&webcam.source, settings)?;
            registry.register(webcam, backend)?;
        }

        info!(webcams = registry.len(), "Webcam registry ready");
        Ok(registry)
    }

    pub fn register(
        &mut self,
        webcam: Webcam,
        backend: Arc<dyn CaptureBackend>,
    ) -> Result<(), WebcamError> {
        if self.entries.contains_key(&webcam.id) {
            return Err(WebcamError::DuplicateWebcam(webcam.id.to_string()));
        }
        self.entries.insert(
            webcam.id.clone(),
            Arc::new(WebcamEntry {
                webcam: Mutex::new(webcam),
                backend,
            }),
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &WebcamId> {
        self.entries.keys()
    }

    fn entry(&self, id: &WebcamId) -> Result<&Arc<WebcamEntry>, WebcamError> {
        self.entries
            .get(id)
            .ok_or_else(|| WebcamError::WebcamNotFound(id.to_string()))
    }

    /// 1台を更新する。同じカメラの更新中は待たされる
    #[instrument(skip(self))]
    pub async fn update(&self, id: &WebcamId) -> Result<UpdateReport, WebcamError> {
        let entry = self.entry(id)?;
        let mut webcam = entry.webcam.lock().await;
        self.use_case.execute(&mut webcam, entry.backend.as_ref()).await
    }

    /// 全台を並行に更新する。1台の失敗は他に影響しない
    pub async fn update_all(&self) -> Vec<(WebcamId, Result<UpdateReport, WebcamError>)> {
        let mut tasks = JoinSet::new();
        for (id, entry) in &self.entries {
            let id = id.clone();
            let entry = Arc::clone(entry);
            let use_case = Arc::clone(&self.use_case);
            tasks.spawn(async move {
                let mut webcam = entry.webcam.lock().await;
                let result = use_case.execute(&mut webcam, entry.backend.as_ref()).await;
                (id, result)
            });
        }

        let mut results = Vec::with_capacity(self.entries.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => error!(error = %e, "Webcam update task failed"),
            }
        }
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }

    /// 起動直後に全台を1回更新するタスクを開始する
    ///
    /// エンティティの状態はプロセス内にしか無いため、サーバー起動時に最初の画像を取得しておく
    pub fn spawn_initial_update(self: &Arc<Self>) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            for (id, result) in registry.update_all().await {
                match result {
                    Ok(report) => info!(
                        webcam_id = %id,
                        state = %report.state,
                        tiles = report.tiles_written,
                        "Initial update finished"
                    ),
                    Err(e) => warn!(webcam_id = %id, error = %e, "Initial update failed"),
                }
            }
        })
    }

    pub async fn snapshot(&self, id: &WebcamId) -> Result<WebcamSnapshot, WebcamError> {
        let entry = self.entry(id)?;
        let webcam = entry.webcam.lock().await;
        Ok(webcam.snapshot(&self.tile_location))
    }

    pub async fn snapshots(&self) -> Vec<WebcamSnapshot> {
        let mut snapshots = Vec::with_capacity(self.entries.len());
        for entry in self.entries.values() {
            snapshots.push(entry.webcam.lock().await.snapshot(&self.tile_location));
        }
        snapshots
    }
}
