use super::BitmapFont;
use chrono::{DateTime, Local};
use image::{Rgb, RgbImage};

pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// `"<name> @ <DD/MM/YYYY HH:MM:SS>"`
pub fn timestamp_label(name: &str, at: DateTime<Local>) -> String {
    format!("{name} @ {}", at.format(TIMESTAMP_FORMAT))
}

/// 下端に黒帯を描き、その中に白い文字でラベルを左寄せで描く
///
/// 帯の高さはフォントサイズ + 2px
pub fn annotate(image: &mut RgbImage, label: &str, font: &BitmapFont) {
    let (width, height) = image.dimensions();
    let band_height = (font.size() + 2).min(height);
    let band_top = height - band_height;

    for y in band_top..height {
        for x in 0..width {
            image.put_pixel(x, y, Rgb([0, 0, 0]));
        }
    }

    font.draw(
        image,
        1,
        height as i64 - (font.size() as i64 + 1),
        label,
        Rgb([255, 255, 255]),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_label_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap();
        assert_eq!(timestamp_label("Terrarium", at), "Terrarium @ 07/03/2024 09:05:02");
    }

    #[test]
    fn test_annotate_draws_band_and_text() {
        let font = BitmapFont::with_size(10);
        let mut image = RgbImage::from_pixel(200, 50, Rgb([200, 10, 10]));
        annotate(&mut image, "Cam @ 01/01/2024 00:00:00", &font);

        // 帯の上は元のまま
        assert_eq!(image.get_pixel(150, 37).0, [200, 10, 10]);
        // 帯の中は黒か白のみ
        let mut has_text = false;
        for y in 38..50 {
            for x in 0..200 {
                let pixel = image.get_pixel(x, y).0;
                assert!(pixel == [0, 0, 0] || pixel == [255, 255, 255]);
                has_text |= pixel == [255, 255, 255];
            }
        }
        assert!(has_text);
        // 右端は文字が届かない
        assert_eq!(image.get_pixel(199, 45).0, [0, 0, 0]);
    }

    #[test]
    fn test_annotate_is_deterministic() {
        let font = BitmapFont::with_size(10);
        let at = Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let label = timestamp_label("A", at);
        let mut a = RgbImage::new(64, 32);
        let mut b = RgbImage::new(64, 32);
        annotate(&mut a, &label, &font);
        annotate(&mut b, &label, &font);
        assert_eq!(a, b);
    }

    #[test]
    fn test_annotate_tiny_image() {
        let font = BitmapFont::with_size(10);
        let mut image = RgbImage::from_pixel(4, 3, Rgb([9, 9, 9]));
        annotate(&mut image, "X", &font);
        assert_eq!(image.dimensions(), (4, 3));
    }
}
