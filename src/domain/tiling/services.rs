//! タイルピラミッドの生成
//!
//! 各ズームレベルは元画像を直接縮小して作る。前のレベルの画素には依存しない

use super::{DEFAULT_TILE_SIZE, PyramidPlan, TileKey, TileSet};
use crate::domain::imaging::{BitmapFont, annotate, encode_jpeg, timestamp_label};
use crate::domain::webcam::{Clock, WebcamError};
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

pub const DEFAULT_JPEG_QUALITY: u8 = 95;

#[derive(Debug, Clone)]
pub struct TilePyramidBuilder {
    tile_size: u32,
    jpeg_quality: u8,
    font: BitmapFont,
    filter: FilterType,
}

impl Default for TilePyramidBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_SIZE, DEFAULT_JPEG_QUALITY, BitmapFont::with_size(10))
    }
}

impl TilePyramidBuilder {
    pub fn new(tile_size: u32, jpeg_quality: u8, font: BitmapFont) -> Self {
        Self {
            tile_size: tile_size.max(1),
            jpeg_quality,
            font,
            filter: FilterType::Triangle,
        }
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn plan(&self, width: u32, height: u32) -> PyramidPlan {
        PyramidPlan::new(width, height, self.tile_size)
    }

    /// 画像からタイル一式とタイムスタンプ入りのフル解像度画像を作る
    ///
    /// タイムスタンプはレベルごとに描き直すので、各レベルは生成時刻を表示する
    #[instrument(skip(self, raster, clock), fields(width = raster.width(), height = raster.height()))]
    pub fn build(
        &self,
        raster: &RgbImage,
        name: &str,
        clock: &dyn Clock,
    ) -> Result<TileSet, WebcamError> {
        let plan = self.plan(raster.width(), raster.height());
        debug!(
            canvas_size = plan.canvas_size,
            resize_factor = plan.resize_factor,
            max_zoom = plan.max_zoom,
            "Tiling image"
        );

        let mut raw = raster.clone();
        annotate(&mut raw, &timestamp_label(name, clock.now()), &self.font);
        let raw = encode_jpeg(&raw, self.jpeg_quality)?;

        let mut tiles = BTreeMap::new();
        for level in plan.levels() {
            let mut canvas = RgbImage::new(level.canvas_size, level.canvas_size);

            let mut source =
                imageops::resize(raster, level.scaled_width, level.scaled_height, self.filter);
            annotate(&mut source, &timestamp_label(name, clock.now()), &self.font);
            imageops::replace(&mut canvas, &source, level.offset_x, level.offset_y);

            for row in 0..level.tiles_per_side {
                for column in 0..level.tiles_per_side {
                    let tile = self.crop_tile(&canvas, row, column);
                    let key = TileKey::new(level.zoom, row, column);
                    tiles.insert(key, encode_jpeg(&tile, self.jpeg_quality)?);
                }
            }

            debug!(
                zoom = level.zoom,
                canvas_size = level.canvas_size,
                scaled = format!("{}x{}", level.scaled_width, level.scaled_height),
                tiles = level.tiles_per_side * level.tiles_per_side,
                "Created zoom level"
            );
        }

        Ok(TileSet {
            tiles,
            raw,
            max_zoom: plan.max_zoom,
            canvas_size: plan.canvas_size.round() as u32,
        })
    }

    /// キャンバスの端で足りない部分は黒で埋める
    fn crop_tile(&self, canvas: &RgbImage, row: u32, column: u32) -> RgbImage {
        let size = self.tile_size;
        let view = imageops::crop_imm(canvas, column * size, row * size, size, size).to_image();
        if view.dimensions() == (size, size) {
            return view;
        }
        let mut tile = RgbImage::new(size, size);
        imageops::replace(&mut tile, &view, 0, 0);
        tile
    }
}
