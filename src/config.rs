//! アプリケーション設定
//!
//! JSON ファイルから読み込む。ファイルが無い場合は既定値（ウェブカメラなし）を使う

use crate::domain::tiling::{DEFAULT_JPEG_QUALITY, DEFAULT_TILE_SIZE};
use crate::domain::webcam::{DEFAULT_RETRIES, DEFAULT_RETRY_DELAY, Rotation, WebcamError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// 全ウェブカメラ共通の設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebcamSettings {
    /// ビューアと結び付いているため 256 から変更する場合はビューア側の確認が必要
    pub tile_size: u32,
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub warm_up_seconds: u64,
    pub network_timeout_seconds: u64,
    pub font_size: u32,
    pub offline_font_size: u32,
    pub jpeg_quality: u8,
    /// タイルの保存先。ファイル名の前にそのまま連結する
    pub tile_location: String,
    pub offline_image: Option<PathBuf>,
    pub offline_mask: Option<PathBuf>,
}

impl Default for WebcamSettings {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            retries: DEFAULT_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
            warm_up_seconds: 2,
            network_timeout_seconds: 15,
            font_size: 10,
            offline_font_size: 40,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            tile_location: "webcam/".to_string(),
            offline_image: None,
            offline_mask: None,
        }
    }
}

impl WebcamSettings {
    pub fn validate(&self) -> Result<(), WebcamError> {
        if self.tile_size == 0 {
            return Err(WebcamError::InvalidConfiguration(
                "tile_size must be greater than 0".to_string(),
            ));
        }
        if self.retries == 0 {
            return Err(WebcamError::InvalidConfiguration(
                "retries must be at least 1".to_string(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(WebcamError::InvalidConfiguration(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        if self.font_size == 0 || self.offline_font_size == 0 {
            return Err(WebcamError::InvalidConfiguration(
                "font sizes must be greater than 0".to_string(),
            ));
        }
        if self.tile_size != DEFAULT_TILE_SIZE {
            warn!(
                tile_size = self.tile_size,
                "Non-default tile size; the tile viewer has only been validated with 256"
            );
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn warm_up(&self) -> Duration {
        Duration::from_secs(self.warm_up_seconds)
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_secs(self.network_timeout_seconds)
    }

    /// `tile_location` のディレクトリ部分
    pub fn tile_directory(&self) -> PathBuf {
        if self.tile_location.is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(&self.tile_location)
        }
    }
}

/// 1台のウェブカメラの定義
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebcamDefinition {
    #[serde(default)]
    pub id: Option<String>,
    pub location: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rotation: Rotation,
}

/// アプリケーション全体の設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub settings: WebcamSettings,
    pub webcams: Vec<WebcamDefinition>,
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, WebcamError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| WebcamError::InvalidConfiguration(e.to_string()))?;
        config.settings.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, WebcamError> {
        if !path.exists() {
            warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let json = std::fs::read_to_string(path).map_err(|e| {
            WebcamError::InvalidConfiguration(format!("Cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            webcams = config.webcams.len(),
            "Loaded configuration"
        );
        Ok(config)
    }
}
