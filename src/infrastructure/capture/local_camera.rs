use super::device_process::{CAPTURE_GRACE, run_capture};
use crate::domain::webcam::{
    CaptureBackend, CaptureError, LOCAL_CAMERA_LOCATION, Resolution, SourceKind,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::instrument;

pub const RPICAM_PROGRAM: &str = "rpicam-still";

/// Raspberry Pi カメラは 1920x1080 で撮影する
pub const LOCAL_CAMERA_RESOLUTION: Resolution = Resolution {
    width: 1920,
    height: 1080,
};

/// 内蔵カメラ（rpicam-still）
#[derive(Debug, Clone)]
pub struct LocalCameraBackend {
    program: String,
    warm_up: Duration,
}

impl LocalCameraBackend {
    pub fn new(warm_up: Duration) -> Self {
        Self::with_program(RPICAM_PROGRAM, warm_up)
    }

    pub fn with_program(program: impl Into<String>, warm_up: Duration) -> Self {
        Self {
            program: program.into(),
            warm_up,
        }
    }

    /// `-t` がウォームアップ時間。JPEG を標準出力へ書き出す
    fn args(&self) -> Vec<String> {
        vec![
            "-n".to_string(),
            "-t".to_string(),
            self.warm_up.as_millis().max(1).to_string(),
            "--width".to_string(),
            LOCAL_CAMERA_RESOLUTION.width.to_string(),
            "--height".to_string(),
            LOCAL_CAMERA_RESOLUTION.height.to_string(),
            "-e".to_string(),
            "jpg".to_string(),
            "-o".to_string(),
            "-".to_string(),
        ]
    }
}

#[async_trait]
impl CaptureBackend for LocalCameraBackend {
    fn kind(&self) -> SourceKind {
        SourceKind::LocalCamera
    }

    #[instrument(skip(self), fields(program = %self.program))]
    async fn capture_once(&self) -> Result<Vec<u8>, CaptureError> {
        run_capture(
            &self.program,
            &self.args(),
            LOCAL_CAMERA_LOCATION,
            self.warm_up + CAPTURE_GRACE,
        )
        .await
    }
}
