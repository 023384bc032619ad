use crate::application::UpdateReport;
use crate::domain::webcam::WebcamSnapshot;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub version: String,
    pub build_timestamp: String,
    pub os: String,
    pub arch: String,
    pub uptime_seconds: u64,
    pub webcams: usize,
}

/// 手動更新の結果と更新後のメタデータ
#[derive(Debug, Clone, Serialize)]
pub struct UpdateResponse {
    pub report: UpdateReport,
    pub webcam: WebcamSnapshot,
}
