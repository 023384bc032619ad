use crate::config::WebcamSettings;
use crate::domain::imaging::{BitmapFont, OfflinePlaceholder};
use crate::domain::tiling::TilePyramidBuilder;
use crate::domain::webcam::{
    AcquiredImage, AcquisitionController, CaptureBackend, Clock, TileRepository, Webcam,
    WebcamError, WebcamId, WebcamState,
};
use crate::measure_time;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::spawn_blocking;
use tracing::{debug, info, instrument};

/// 1回の更新の結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateReport {
    pub webcam_id: WebcamId,
    pub state: WebcamState,
    pub attempts: u32,
    /// タイルを書き直したか。オフラインのままの場合は書き直さない
    pub rebuilt: bool,
    pub tiles_written: usize,
}

/// 画像を取得し、タイルピラミッドを作って保存するユースケース
pub struct UpdateWebcamUseCase {
    controller: AcquisitionController,
    builder: Arc<TilePyramidBuilder>,
    repository: Arc<dyn TileRepository>,
    clock: Arc<dyn Clock>,
}

impl UpdateWebcamUseCase {
    pub fn new(
        controller: AcquisitionController,
        builder: TilePyramidBuilder,
        repository: Arc<dyn TileRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            controller,
            builder: Arc::new(builder),
            repository,
            clock,
        }
    }

    pub fn from_settings(
        settings: &WebcamSettings,
        repository: Arc<dyn TileRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let placeholder = OfflinePlaceholder::new(
            settings.offline_image.clone(),
            settings.offline_mask.clone(),
            BitmapFont::with_size(settings.offline_font_size),
        );
        let controller =
            AcquisitionController::new(settings.retries, settings.retry_delay(), placeholder);
        let builder = TilePyramidBuilder::new(
            settings.tile_size,
            settings.jpeg_quality,
            BitmapFont::with_size(settings.font_size),
        );
        Self::new(controller, builder, repository, clock)
    }

    #[instrument(skip_all, fields(webcam_id = %webcam.id, name = %webcam.name))]
    pub async fn execute(
        &self,
        webcam: &mut Webcam,
        backend: &dyn CaptureBackend,
    ) -> Result<UpdateReport, WebcamError> {
        let acquisition = self
            .controller
            .acquire(webcam, backend, self.clock.as_ref())
            .await?;

        let Some(image) = acquisition.image else {
            debug!("Offline tiles are already in place");
            return Ok(UpdateReport {
                webcam_id: webcam.id.clone(),
                state: webcam.state,
                attempts: acquisition.attempts,
                rebuilt: false,
                tiles_written: 0,
            });
        };

        let (raster, live_resolution) = match image {
            AcquiredImage::Live(raw) => {
                let resolution = raw.resolution();
                (raw.image, Some(resolution))
            }
            AcquiredImage::Offline(placeholder) => (placeholder, None),
        };

        let builder = Arc::clone(&self.builder);
        let clock = Arc::clone(&self.clock);
        let name = webcam.name.clone();
        let tile_set = measure_time!("build_tile_pyramid", {
            spawn_blocking(move || builder.build(&raster, &name, clock.as_ref())).await??
        });

        let max_zoom = tile_set.max_zoom;
        let tiles_written = self.repository.store_tile_set(&webcam.id, tile_set).await?;

        // オフライン画像のピラミッドは解像度と最大ズームを上書きしない
        if let Some(resolution) = live_resolution {
            webcam.record_pyramid(resolution, max_zoom);
        }
        // 保存に失敗した場合は次回の更新でオフライン画像を作り直す
        if let Some(at) = acquisition.went_offline_at {
            webcam.mark_offline(at);
        }

        info!(
            state = %webcam.state,
            attempts = acquisition.attempts,
            tiles = tiles_written,
            max_zoom,
            "Updated webcam tiles"
        );

        Ok(UpdateReport {
            webcam_id: webcam.id.clone(),
            state: webcam.state,
            attempts: acquisition.attempts,
            rebuilt: true,
            tiles_written,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::imaging::decode;
    use crate::domain::tiling::TileKey;
    use crate::domain::webcam::{CaptureError, Resolution, Rotation};
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::storage::InMemoryTileRepository;
    use crate::test_helpers::{ManualClock, ScriptedBackend, jpeg_bytes};
    use async_trait::async_trait;
    use image::RgbImage;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tracing_test::traced_test;

    /// `fail_next` を立てると次の書き込みを1回だけ失敗させる保存先
    #[derive(Clone, Default)]
    struct FlakyRepository {
        inner: InMemoryTileRepository,
        fail_next: Arc<AtomicBool>,
    }

    impl FlakyRepository {
        fn fail_next(&self) {
            self.fail_next.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl TileRepository for FlakyRepository {
        async fn put_tile(
            &self,
            id: &WebcamId,
            key: TileKey,
            bytes: Vec<u8>,
        ) -> Result<(), WebcamError> {
            self.inner.put_tile(id, key, bytes).await
        }

        async fn put_raw(&self, id: &WebcamId, bytes: Vec<u8>) -> Result<(), WebcamError> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(WebcamError::TileStorage("no space left on device".to_string()));
            }
            self.inner.put_raw(id, bytes).await
        }
    }

    fn settings() -> WebcamSettings {
        WebcamSettings {
            retry_delay_ms: 0,
            ..WebcamSettings::default()
        }
    }

    fn webcam() -> Webcam {
        Webcam::new(None, "http://cam.local/snap.jpg", "Terrarium", Rotation::None).unwrap()
    }

    fn is_red(pixel: [u8; 3]) -> bool {
        pixel[0] > 180 && pixel[1] < 70 && pixel[2] < 70
    }

    /// プレビュータイルにオフライン画像のマスク帯と白い文字があるか確認する
    ///
    /// 組み込みの 1280x720 の代替画像は 256x144 に縮小され、縦方向に 56 ずれる。
    /// マスク帯は x 56..200, y 108..148 に入る
    fn assert_offline_banner(preview: &RgbImage) {
        let pad = preview.get_pixel(128, 110).0;
        assert!(pad.iter().all(|&c| c < 35), "mask band is not dark: {pad:?}");

        let background = preview.get_pixel(20, 80).0;
        assert!(background.iter().all(|&c| (35..70).contains(&c)), "{background:?}");

        let has_text = (112..146)
            .flat_map(|y| (60..196).map(move |x| (x, y)))
            .any(|(x, y)| preview.get_pixel(x, y).0.iter().all(|&c| c > 100));
        assert!(has_text, "no text on the mask band");
    }

    #[tokio::test]
    async fn test_live_image_builds_pyramid() {
        let repository = InMemoryTileRepository::new();
        let use_case = UpdateWebcamUseCase::from_settings(
            &settings(),
            Arc::new(repository.clone()),
            Arc::new(FixedClock::default()),
        );
        let backend = ScriptedBackend::always(jpeg_bytes(1000, 600));
        let mut webcam = webcam();

        let report = use_case.execute(&mut webcam, &backend).await.unwrap();

        assert!(report.rebuilt);
        assert_eq!(report.state, WebcamState::Online);
        assert_eq!(report.attempts, 1);
        assert_eq!(report.tiles_written, 21);
        assert_eq!(webcam.resolution, Some(Resolution::new(1000, 600)));
        assert_eq!(webcam.max_zoom, 2);
        assert_eq!(repository.tile_count(&webcam.id).await, 21);

        let raw = decode(&repository.raw(&webcam.id).await.unwrap()).unwrap();
        assert_eq!(raw.dimensions(), (1000, 600));
    }

    #[tokio::test]
    async fn test_first_update_failing_publishes_placeholder() {
        let repository = InMemoryTileRepository::new();
        let use_case = UpdateWebcamUseCase::from_settings(
            &settings(),
            Arc::new(repository.clone()),
            Arc::new(FixedClock::default()),
        );
        let backend = ScriptedBackend::always_failing(CaptureError::NetworkFailure("down".into()));
        let mut webcam = webcam();

        let report = use_case.execute(&mut webcam, &backend).await.unwrap();

        assert_eq!(backend.calls(), 3);
        assert!(report.rebuilt);
        assert_eq!(report.state, WebcamState::Offline);
        assert!(webcam.resolution.is_none());
        assert_eq!(webcam.max_zoom, 0);

        let preview = repository.tile(&webcam.id, TileKey::preview()).await.unwrap();
        let preview = decode(&preview).unwrap();
        assert!(!is_red(preview.get_pixel(128, 128).0));
    }

    #[tokio::test]
    async fn test_repeated_failure_keeps_last_known_good() {
        let repository = InMemoryTileRepository::new();
        let clock = Arc::new(ManualClock::new(FixedClock::default().now()));
        let use_case = UpdateWebcamUseCase::from_settings(
            &settings(),
            Arc::new(repository.clone()),
            clock.clone(),
        );
        let backend = ScriptedBackend::new(vec![Ok(jpeg_bytes(1000, 600))]);
        let mut webcam = webcam();

        use_case.execute(&mut webcam, &backend).await.unwrap();
        let online_at = webcam.last_update.unwrap();
        let online_preview = repository.tile(&webcam.id, TileKey::preview()).await;

        clock.advance(60);
        let first = use_case.execute(&mut webcam, &backend).await.unwrap();
        assert!(first.rebuilt);
        assert_eq!(first.state, WebcamState::Offline);
        let offline_preview = repository.tile(&webcam.id, TileKey::preview()).await;
        assert_ne!(offline_preview, online_preview);

        clock.advance(60);
        let second = use_case.execute(&mut webcam, &backend).await.unwrap();
        assert!(!second.rebuilt);
        assert_eq!(second.tiles_written, 0);
        assert_eq!(repository.tile(&webcam.id, TileKey::preview()).await, offline_preview);

        assert_eq!(webcam.resolution, Some(Resolution::new(1000, 600)));
        assert_eq!(webcam.max_zoom, 2);
        assert!(webcam.last_update.unwrap() > online_at);
        assert_eq!(webcam.last_update.unwrap(), clock.now());
    }

    #[tokio::test]
    async fn test_recovers_after_offline() {
        let repository = InMemoryTileRepository::new();
        let use_case = UpdateWebcamUseCase::from_settings(
            &settings(),
            Arc::new(repository.clone()),
            Arc::new(FixedClock::default()),
        );
        let backend = ScriptedBackend::always_failing(CaptureError::DeviceUnavailable("busy".into()));
        let mut webcam = webcam();

        use_case.execute(&mut webcam, &backend).await.unwrap();
        assert_eq!(webcam.state, WebcamState::Offline);

        backend.push(Ok(jpeg_bytes(640, 480)));
        let report = use_case.execute(&mut webcam, &backend).await.unwrap();
        assert_eq!(report.state, WebcamState::Online);
        assert_eq!(webcam.resolution, Some(Resolution::new(640, 480)));
        let preview = decode(&repository.tile(&webcam.id, TileKey::preview()).await.unwrap()).unwrap();
        assert!(is_red(preview.get_pixel(128, 128).0));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_online_to_offline_replaces_preview_with_banner() {
        let repository = InMemoryTileRepository::new();
        let use_case = UpdateWebcamUseCase::from_settings(
            &settings(),
            Arc::new(repository.clone()),
            Arc::new(FixedClock::default()),
        );
        let backend = ScriptedBackend::new(vec![Ok(jpeg_bytes(1000, 600))]);
        let mut webcam = webcam();

        use_case.execute(&mut webcam, &backend).await.unwrap();
        let online_bytes = repository.tile(&webcam.id, TileKey::preview()).await.unwrap();
        assert!(is_red(decode(&online_bytes).unwrap().get_pixel(128, 128).0));

        let report = use_case.execute(&mut webcam, &backend).await.unwrap();
        assert!(report.rebuilt);
        assert_eq!(report.state, WebcamState::Offline);
        assert!(logs_contain("Webcam went offline"));

        let offline_bytes = repository.tile(&webcam.id, TileKey::preview()).await.unwrap();
        assert_ne!(offline_bytes, online_bytes);
        let preview = decode(&offline_bytes).unwrap();
        assert!(!is_red(preview.get_pixel(128, 128).0));
        assert_offline_banner(&preview);
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_offline_transition_pending() {
        let repository = FlakyRepository::default();
        let use_case = UpdateWebcamUseCase::from_settings(
            &settings(),
            Arc::new(repository.clone()),
            Arc::new(FixedClock::default()),
        );
        let backend = ScriptedBackend::new(vec![Ok(jpeg_bytes(1000, 600))]);
        let mut webcam = webcam();

        use_case.execute(&mut webcam, &backend).await.unwrap();
        let online_bytes = repository.inner.tile(&webcam.id, TileKey::preview()).await;

        repository.fail_next();
        let err = use_case.execute(&mut webcam, &backend).await.unwrap_err();
        assert!(matches!(err, WebcamError::TileStorage(_)));
        assert_eq!(webcam.state, WebcamState::Online);

        // 次の失敗でオフライン画像を改めて保存する
        let report = use_case.execute(&mut webcam, &backend).await.unwrap();
        assert!(report.rebuilt);
        assert_eq!(report.state, WebcamState::Offline);
        assert_eq!(webcam.state, WebcamState::Offline);

        let offline_bytes = repository.inner.tile(&webcam.id, TileKey::preview()).await;
        assert_ne!(offline_bytes, online_bytes);
        let preview = decode(&offline_bytes.unwrap()).unwrap();
        assert!(!is_red(preview.get_pixel(128, 128).0));
        assert_offline_banner(&preview);
        assert_eq!(webcam.resolution, Some(Resolution::new(1000, 600)));
    }
}
