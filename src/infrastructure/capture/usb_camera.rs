use super::device_process::{CAPTURE_GRACE, run_capture};
use crate::domain::imaging::{bgr_to_rgb, encode_jpeg};
use crate::domain::webcam::{
    CaptureBackend, CaptureError, Resolution, SourceKind, USB_DEVICE_PREFIX,
};
use async_trait::async_trait;
use image::RgbImage;
use std::time::Duration;
use tokio::task::spawn_blocking;
use tracing::instrument;

pub const FFMPEG_PROGRAM: &str = "ffmpeg";

/// USB カメラは 1280x720 を要求する
pub const USB_CAMERA_RESOLUTION: Resolution = Resolution {
    width: 1280,
    height: 720,
};

/// V4L2 デバイス（ffmpeg 経由で BGR の生フレームを1枚読む）
#[derive(Debug, Clone)]
pub struct UsbCameraBackend {
    program: String,
    index: u32,
    warm_up: Duration,
    jpeg_quality: u8,
}

impl UsbCameraBackend {
    pub fn new(index: u32, warm_up: Duration, jpeg_quality: u8) -> Self {
        Self {
            program: FFMPEG_PROGRAM.to_string(),
            index,
            warm_up,
            jpeg_quality,
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn device_path(&self) -> String {
        format!("{USB_DEVICE_PREFIX}{}", self.index)
    }

    /// `-ss` でウォームアップ中のフレームを捨てる
    fn args(&self) -> Vec<String> {
        let Resolution { width, height } = USB_CAMERA_RESOLUTION;
        let video_size = format!("{width}x{height}");
        let device = self.device_path();
        let seek = format!("{:.3}", self.warm_up.as_secs_f64());
        let scale = format!("scale={width}:{height}");
        [
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "video4linux2",
            "-video_size",
            video_size.as_str(),
            "-i",
            device.as_str(),
            "-ss",
            seek.as_str(),
            "-frames:v",
            "1",
            "-vf",
            scale.as_str(),
            "-pix_fmt",
            "bgr24",
            "-f",
            "rawvideo",
            "-",
        ]
        .iter()
        .map(|arg| arg.to_string())
        .collect()
    }
}

/// BGR の生フレームを RGB に並べ替えて JPEG にする
pub fn frame_to_jpeg(
    frame: &[u8],
    resolution: Resolution,
    quality: u8,
) -> Result<Vec<u8>, CaptureError> {
    let expected = resolution.width as usize * resolution.height as usize * 3;
    if frame.len() < expected {
        return Err(CaptureError::DecodeFailure(format!(
            "Short frame: expected {expected} bytes, got {}",
            frame.len()
        )));
    }

    let rgb = bgr_to_rgb(&frame[..expected]);
    let image = RgbImage::from_raw(resolution.width, resolution.height, rgb).ok_or_else(|| {
        CaptureError::DecodeFailure("Frame does not match the requested size".to_string())
    })?;
    encode_jpeg(&image, quality).map_err(|e| CaptureError::DecodeFailure(e.to_string()))
}

#[async_trait]
impl CaptureBackend for UsbCameraBackend {
    fn kind(&self) -> SourceKind {
        SourceKind::Usb
    }

    #[instrument(skip(self), fields(device = %self.device_path()))]
    async fn capture_once(&self) -> Result<Vec<u8>, CaptureError> {
        let frame = run_capture(
            &self.program,
            &self.args(),
            &self.device_path(),
            self.warm_up + CAPTURE_GRACE,
        )
        .await?;

        let quality = self.jpeg_quality;
        spawn_blocking(move || frame_to_jpeg(&frame, USB_CAMERA_RESOLUTION, quality))
            .await
            .map_err(|e| CaptureError::DecodeFailure(e.to_string()))?
    }
}
