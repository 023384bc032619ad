//! ウェブカメラ集約のエンティティ
//!
//! 識別子、設定、最後に取得した画像の情報と状態を保持する

use super::{Resolution, Rotation, WebcamError, WebcamId, WebcamSource, WebcamState};
use crate::domain::tiling::{TileKey, raw_file_name};
use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{info, warn};

/// ウェブカメラエンティティ
#[derive(Debug, Clone)]
pub struct Webcam {
    pub id: WebcamId,
    pub location: String,
    pub source: WebcamSource,
    pub name: String,
    pub rotation: Rotation,
    pub resolution: Option<Resolution>,
    pub max_zoom: u32,
    pub last_update: Option<DateTime<Local>>,
    pub state: WebcamState,
}

impl Webcam {
    /// 新しいウェブカメラを作成
    ///
    /// IDが無い場合はロケーションから導出する
    pub fn new(
        id: Option<WebcamId>,
        location: impl Into<String>,
        name: impl Into<String>,
        rotation: Rotation,
    ) -> Result<Self, WebcamError> {
        let location = location.into();
        let source = WebcamSource::parse(&location)?;
        let id = id.unwrap_or_else(|| WebcamId::derive(&location));
        let webcam = Self {
            id,
            location,
            source,
            name: name.into(),
            rotation,
            resolution: None,
            max_zoom: 0,
            last_update: None,
            state: WebcamState::Uninitialized,
        };

        info!(
            webcam_id = %webcam.id,
            kind = %webcam.source.kind(),
            name = %webcam.name,
            location = %webcam.location,
            "Initialized webcam"
        );

        Ok(webcam)
    }

    pub fn is_online(&self) -> bool {
        self.state.is_online()
    }

    /// 取得に成功した
    pub fn mark_online(&mut self, at: DateTime<Local>) {
        self.state = WebcamState::Online;
        self.last_update = Some(at);
    }

    /// すべての試行が失敗した。解像度と最大ズームは最後の成功時の値を保つ
    pub fn mark_offline(&mut self, at: DateTime<Local>) {
        if self.state == WebcamState::Online {
            warn!(
                webcam_id = %self.id,
                name = %self.name,
                location = %self.location,
                "Webcam went offline"
            );
        }
        self.state = WebcamState::Offline;
        self.last_update = Some(at);
    }

    /// ライブ画像からタイルを生成した結果を記録
    pub fn record_pyramid(&mut self, resolution: Resolution, max_zoom: u32) {
        self.resolution = Some(resolution);
        self.max_zoom = max_zoom;
    }

    /// メタデータのスナップショット
    pub fn snapshot(&self, tile_location: &str) -> WebcamSnapshot {
        let id = self.id.as_str();
        WebcamSnapshot {
            id: self.id.clone(),
            location: self.location.clone(),
            name: self.name.clone(),
            rotation: self.rotation,
            resolution: self.resolution,
            max_zoom: self.max_zoom,
            state: self.state,
            last_update: self.last_update.map(|at| at.timestamp()),
            image: format!("{tile_location}{}", raw_file_name(id)),
            preview: format!("{tile_location}{}", TileKey::preview().file_name(id)),
        }
    }
}

/// 呼び出し側に公開するメタデータ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebcamSnapshot {
    pub id: WebcamId,
    pub location: String,
    pub name: String,
    pub rotation: Rotation,
    pub resolution: Option<Resolution>,
    pub max_zoom: u32,
    pub state: WebcamState,
    /// Unix 秒
    pub last_update: Option<i64>,
    pub image: String,
    pub preview: String,
}
