//! 取得コントローラ
//!
//! バックエンドへの再試行、オンライン/オフラインの遷移、オフライン画像の生成を行う。
//! タイルの書き込みは行わない

use super::{CaptureBackend, CaptureError, Clock, Rotation, Webcam, WebcamError, WebcamState};
use crate::domain::imaging::{OfflinePlaceholder, RawImage, decode, rotate};
use chrono::{DateTime, Local};
use image::RgbImage;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::spawn_blocking;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// タイル化の対象となる画像
#[derive(Debug, Clone)]
pub enum AcquiredImage {
    Live(RawImage),
    Offline(RgbImage),
}

/// 1回の取得の結果
#[derive(Debug, Clone)]
pub struct Acquisition {
    /// 既にオフラインでタイルを作り直す必要がない場合は `None`
    pub image: Option<AcquiredImage>,
    pub attempts: u32,
    /// オフライン画像を返した場合の遷移時刻。タイルの保存後に `Webcam::mark_offline` で確定する
    pub went_offline_at: Option<DateTime<Local>>,
}

#[derive(Debug, Clone)]
pub struct AcquisitionController {
    retries: u32,
    retry_delay: Duration,
    placeholder: Arc<OfflinePlaceholder>,
}

impl AcquisitionController {
    pub fn new(retries: u32, retry_delay: Duration, placeholder: OfflinePlaceholder) -> Self {
        Self {
            retries: retries.max(1),
            retry_delay,
            placeholder: Arc::new(placeholder),
        }
    }

    /// 最大 `retries` 回まで取得を試み、エンティティの状態と最終更新時刻を更新する
    ///
    /// 試行の間の待機は非同期スリープで、他のウェブカメラの更新を妨げない。
    /// 状態は試行がすべて終わってから書き換えるので、途中で future が破棄されても
    /// エンティティは変化しない。オフラインへの遷移だけは呼び出し側がオフライン画像の
    /// タイルを保存するまで確定させない
    #[instrument(skip_all, fields(webcam_id = %webcam.id, kind = %backend.kind()))]
    pub async fn acquire(
        &self,
        webcam: &mut Webcam,
        backend: &dyn CaptureBackend,
        clock: &dyn Clock,
    ) -> Result<Acquisition, WebcamError> {
        debug!(location = %webcam.location, "Start getting raw image data");
        let previous = webcam.state;
        let mut attempts = 0;

        for attempt in 1..=self.retries {
            attempts = attempt;
            match self.attempt(backend, webcam.rotation).await {
                Ok(raw) => {
                    debug!(
                        attempt,
                        resolution = %raw.resolution(),
                        rotation = %webcam.rotation,
                        "Loaded raw image"
                    );
                    webcam.mark_online(clock.now());
                    return Ok(Acquisition {
                        image: Some(AcquiredImage::Live(raw)),
                        attempts,
                        went_offline_at: None,
                    });
                }
                Err(err) => {
                    warn!(
                        attempt,
                        retries = self.retries,
                        kind = err.kind(),
                        error = %err,
                        name = %webcam.name,
                        location = %webcam.location,
                        "Capture attempt did not succeed"
                    );
                    if attempt < self.retries {
                        sleep(self.retry_delay).await;
                    }
                }
            }
        }

        let now = clock.now();
        if previous == WebcamState::Offline {
            info!(name = %webcam.name, "Webcam is still offline, keeping offline tiles");
            webcam.mark_offline(now);
            return Ok(Acquisition {
                image: None,
                attempts,
                went_offline_at: None,
            });
        }

        warn!(
            name = %webcam.name,
            location = %webcam.location,
            "Raw image is not available, rendering offline placeholder"
        );
        let placeholder = Arc::clone(&self.placeholder);
        let image = spawn_blocking(move || placeholder.render(now)).await??;

        Ok(Acquisition {
            image: Some(AcquiredImage::Offline(image)),
            attempts,
            went_offline_at: Some(now),
        })
    }

    async fn attempt(
        &self,
        backend: &dyn CaptureBackend,
        rotation: Rotation,
    ) -> Result<RawImage, CaptureError> {
        let bytes = backend.capture_once().await?;
        let source = backend.kind();
        spawn_blocking(move || decode(&bytes).map(|image| RawImage::new(rotate(image, rotation), source)))
            .await
            .map_err(|e| CaptureError::DecodeFailure(e.to_string()))?
    }
}
