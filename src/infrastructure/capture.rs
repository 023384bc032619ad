//! 取得元バックエンドの実装

pub mod device_process;
pub mod local_camera;
pub mod network_camera;
pub mod usb_camera;

pub use local_camera::LocalCameraBackend;
pub use network_camera::NetworkCameraBackend;
pub use usb_camera::UsbCameraBackend;

use crate::config::WebcamSettings;
use crate::domain::webcam::{CaptureBackend, WebcamError, WebcamSource};
use std::sync::Arc;

/// 取得元に対応するバックエンドを作る。ウェブカメラごとに一度だけ呼ばれる
pub fn backend_for(
    source: &WebcamSource,
    settings: &WebcamSettings,
) -> Result<Arc<dyn CaptureBackend>, WebcamError> {
    let backend: Arc<dyn CaptureBackend> = match source {
        WebcamSource::LocalCamera => Arc::new(LocalCameraBackend::new(settings.warm_up())),
        WebcamSource::UsbDevice { index } => Arc::new(UsbCameraBackend::new(
            *index,
            settings.warm_up(),
            settings.jpeg_quality,
        )),
        WebcamSource::Network { url, auth } => Arc::new(NetworkCameraBackend::new(
            url.clone(),
            auth.clone(),
            settings.network_timeout(),
        )?),
    };
    Ok(backend)
}
