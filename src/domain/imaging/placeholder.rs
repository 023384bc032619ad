//! オフライン時の代替画像
//!
//! 背景画像の中央に半透明のマスクを合成し、マスク上に
//! 「Offline since:」と日時の2行を中央揃えで描く

use super::{BitmapFont, TIMESTAMP_FORMAT};
use crate::domain::webcam::WebcamError;
use chrono::{DateTime, Local};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage, imageops};
use std::path::{Path, PathBuf};
use tracing::debug;

const BUILTIN_BACKGROUND_SIZE: (u32, u32) = (1280, 720);
const BUILTIN_BACKGROUND: Rgb<u8> = Rgb([48, 48, 48]);
const BUILTIN_MASK_SIZE: (u32, u32) = (720, 200);
const BUILTIN_MASK: Rgba<u8> = Rgba([0, 0, 0, 160]);
const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

pub const OFFLINE_HEADLINE: &str = "Offline since:";

#[derive(Debug, Clone)]
pub struct OfflinePlaceholder {
    background: Option<PathBuf>,
    mask: Option<PathBuf>,
    font: BitmapFont,
}

impl OfflinePlaceholder {
    /// アセットが `None` の場合は組み込みの背景とマスクを使う
    pub fn new(background: Option<PathBuf>, mask: Option<PathBuf>, font: BitmapFont) -> Self {
        Self {
            background,
            mask,
            font,
        }
    }

    pub fn builtin(font: BitmapFont) -> Self {
        Self::new(None, None, font)
    }

    /// 代替画像を生成する。設定されたアセットを読めない場合は失敗する
    pub fn render(&self, since: DateTime<Local>) -> Result<RgbImage, WebcamError> {
        let background = match &self.background {
            Some(path) => load_asset(path)?.to_rgba8(),
            None => DynamicImage::ImageRgb8(RgbImage::from_pixel(
                BUILTIN_BACKGROUND_SIZE.0,
                BUILTIN_BACKGROUND_SIZE.1,
                BUILTIN_BACKGROUND,
            ))
            .to_rgba8(),
        };
        let mut mask = match &self.mask {
            Some(path) => load_asset(path)?.to_rgba8(),
            None => RgbaImage::from_pixel(BUILTIN_MASK_SIZE.0, BUILTIN_MASK_SIZE.1, BUILTIN_MASK),
        };

        let lines = [
            OFFLINE_HEADLINE.to_string(),
            since.format(TIMESTAMP_FORMAT).to_string(),
        ];
        self.draw_centered(&mut mask, &lines);

        let mut canvas = background;
        let x = (canvas.width() as i64 - mask.width() as i64) / 2;
        let y = (canvas.height() as i64 - mask.height() as i64) / 2;
        imageops::overlay(&mut canvas, &mask, x, y);

        debug!(
            background = format!("{}x{}", canvas.width(), canvas.height()),
            mask = format!("{}x{}", mask.width(), mask.height()),
            "Rendered offline placeholder"
        );

        Ok(DynamicImage::ImageRgba8(canvas).to_rgb8())
    }

    fn draw_centered(&self, mask: &mut RgbaImage, lines: &[String]) {
        let line_height = self.font.line_height() as i64;
        let block_height = line_height * lines.len() as i64;
        let top = (mask.height() as i64 - block_height) / 2;

        for (index, line) in lines.iter().enumerate() {
            let x = (mask.width() as i64 - self.font.text_width(line) as i64) / 2;
            let y = top + index as i64 * line_height;
            self.font.draw(mask, x, y, line, TEXT_COLOR);
        }
    }
}

fn load_asset(path: &Path) -> Result<DynamicImage, WebcamError> {
    image::open(path).map_err(|e| WebcamError::PlaceholderAsset {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn since() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).unwrap()
    }

    #[test]
    fn test_builtin_placeholder_layout() {
        let placeholder = OfflinePlaceholder::builtin(BitmapFont::with_size(40));
        let image = placeholder.render(since()).unwrap();
        assert_eq!(image.dimensions(), BUILTIN_BACKGROUND_SIZE);

        // マスクの外側は背景のまま
        assert_eq!(image.get_pixel(5, 5).0, [48, 48, 48]);

        // マスク領域の余白は暗くなる
        let mask_left = (1280 - 720) / 2;
        let mask_top = (720 - 200) / 2;
        let shaded = image.get_pixel(mask_left + 2, mask_top + 2).0;
        assert!(shaded[0] < 30, "{shaded:?}");

        // 文字は白
        let has_text = (mask_top..mask_top + 200)
            .flat_map(|y| (mask_left..mask_left + 720).map(move |x| (x, y)))
            .any(|(x, y)| image.get_pixel(x, y).0 == [255, 255, 255]);
        assert!(has_text);
    }

    #[test]
    fn test_missing_asset_is_an_error() {
        let placeholder = OfflinePlaceholder::new(
            Some(PathBuf::from("/nonexistent/webcam_offline.png")),
            None,
            BitmapFont::with_size(40),
        );
        let err = placeholder.render(since()).unwrap_err();
        assert!(matches!(err, WebcamError::PlaceholderAsset { .. }));
    }
}
