use thiserror::Error;

/// 1回の取得試行の失敗
///
/// どの種別も取得コントローラでは同じように再試行される
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Image decode failed: {0}")]
    DecodeFailure(String),
}

impl CaptureError {
    pub fn kind(&self) -> &'static str {
        match self {
            CaptureError::DeviceUnavailable(_) => "device_unavailable",
            CaptureError::NetworkFailure(_) => "network_failure",
            CaptureError::DecodeFailure(_) => "decode_failure",
        }
    }
}

/// `update()` 呼び出しを中断させるエラーと設定エラー
#[derive(Error, Debug)]
pub enum WebcamError {
    #[error("Unsupported webcam location: {0}")]
    UnsupportedLocation(String),

    #[error("Invalid rotation: {0}")]
    InvalidRotation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Webcam not found: {0}")]
    WebcamNotFound(String),

    #[error("Duplicate webcam id: {0}")]
    DuplicateWebcam(String),

    #[error("Offline placeholder asset {path} could not be loaded: {message}")]
    PlaceholderAsset { path: String, message: String },

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Tile storage failed: {0}")]
    TileStorage(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl WebcamError {
    /// 設定に起因するエラーか
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            WebcamError::UnsupportedLocation(_)
                | WebcamError::InvalidRotation(_)
                | WebcamError::InvalidConfiguration(_)
                | WebcamError::DuplicateWebcam(_)
        )
    }
}

impl From<tokio::task::JoinError> for WebcamError {
    fn from(err: tokio::task::JoinError) -> Self {
        WebcamError::TaskFailed(err.to_string())
    }
}
