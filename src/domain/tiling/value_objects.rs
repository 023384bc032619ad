//! タイルピラミッドの値オブジェクト
//!
//! タイルのアドレス、生成結果、キャンバス寸法の計算を定義

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// ビューアと互換性のあるタイルサイズ。これより小さいサイズはビューア側で動作しない
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// タイルのアドレス
///
/// `row` はキャンバスの縦方向（y）、`column` は横方向（x）のインデックス。
/// タイル `(zoom, row, column)` はキャンバスの
/// y ∈ `[row * tile, (row + 1) * tile)`、x ∈ `[column * tile, (column + 1) * tile)` を覆う
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileKey {
    pub zoom: u32,
    pub row: u32,
    pub column: u32,
}

impl TileKey {
    pub fn new(zoom: u32, row: u32, column: u32) -> Self {
        Self { zoom, row, column }
    }

    /// プレビュー（最も粗いレベルの単一タイル）
    pub fn preview() -> Self {
        Self::new(0, 0, 0)
    }

    /// 保存時のファイル名
    pub fn file_name(&self, webcam_id: &str) -> String {
        format!(
            "{webcam_id}_tile_{}_{}_{}.jpg",
            self.zoom, self.row, self.column
        )
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.row, self.column)
    }
}

/// フル解像度画像の保存時のファイル名
pub fn raw_file_name(webcam_id: &str) -> String {
    format!("{webcam_id}_raw.jpg")
}

/// 1回の生成で作られたタイル一式
#[derive(Debug, Clone, Default)]
pub struct TileSet {
    pub tiles: BTreeMap<TileKey, Vec<u8>>,
    /// タイムスタンプ入りのフル解像度画像
    pub raw: Vec<u8>,
    pub max_zoom: u32,
    pub canvas_size: u32,
}

impl TileSet {
    pub fn preview(&self) -> Option<&[u8]> {
        self.tiles.get(&TileKey::preview()).map(Vec::as_slice)
    }

    pub fn tile(&self, key: TileKey) -> Option<&[u8]> {
        self.tiles.get(&key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles_at(&self, zoom: u32) -> usize {
        self.tiles.keys().filter(|key| key.zoom == zoom).count()
    }
}

/// 1つのズームレベルの寸法
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelGeometry {
    pub zoom: u32,
    pub canvas_size: u32,
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub offset_x: i64,
    pub offset_y: i64,
    pub tiles_per_side: u32,
}

/// ピラミッド全体の寸法計画
///
/// キャンバスと縮小後の画像寸法は浮動小数のまま各レベルで半分にし、
/// 使用時にのみ丸める。元画像から毎回計算し直すと丸め方が変わるため、この漸化式を保つ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PyramidPlan {
    pub tile_size: u32,
    pub canvas_size: f64,
    pub resize_factor: f64,
    pub scaled_width: f64,
    pub scaled_height: f64,
    pub max_zoom: u32,
}

impl PyramidPlan {
    pub fn new(width: u32, height: u32, tile_size: u32) -> Self {
        let tile_size = tile_size.max(1);
        let longest_side = width.max(height).max(1) as f64;

        // タイル1枚より小さい画像も1枚のタイルに収まるよう拡大する
        let canvas_size = (2f64.powf(longest_side.log2().ceil())).max(tile_size as f64);
        let resize_factor = canvas_size / longest_side;
        let max_zoom = (canvas_size / tile_size as f64).log2().floor().max(0.0) as u32;

        Self {
            tile_size,
            canvas_size,
            resize_factor,
            scaled_width: width as f64 * resize_factor,
            scaled_height: height as f64 * resize_factor,
            max_zoom,
        }
    }

    /// `max_zoom` から 0 までのレベルを順に返す
    pub fn levels(&self) -> Vec<LevelGeometry> {
        let mut canvas = self.canvas_size;
        let mut width = self.scaled_width;
        let mut height = self.scaled_height;
        let tile = self.tile_size as f64;

        let mut levels = Vec::with_capacity(self.max_zoom as usize + 1);
        for zoom in (0..=self.max_zoom).rev() {
            levels.push(LevelGeometry {
                zoom,
                canvas_size: canvas.round() as u32,
                scaled_width: (width.round() as u32).max(1),
                scaled_height: (height.round() as u32).max(1),
                offset_x: ((canvas - width) / 2.0).round() as i64,
                offset_y: ((canvas - height) / 2.0).round() as i64,
                tiles_per_side: (canvas / tile).ceil() as u32,
            });

            canvas /= 2.0;
            width /= 2.0;
            height /= 2.0;
        }
        levels
    }

    pub fn total_tiles(&self) -> usize {
        self.levels()
            .iter()
            .map(|level| (level.tiles_per_side as usize).pow(2))
            .sum()
    }
}
