use crate::domain::webcam::{CaptureError, Resolution, Rotation, SourceKind, WebcamError};
use image::codecs::jpeg::JpegEncoder;
use image::{RgbImage, imageops};

/// デコード済みの取得画像
///
/// 1回の `update()` の間だけパイプラインが所有する
#[derive(Debug, Clone)]
pub struct RawImage {
    pub image: RgbImage,
    pub source: SourceKind,
}

impl RawImage {
    pub fn new(image: RgbImage, source: SourceKind) -> Self {
        Self { image, source }
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.image.width(), self.image.height())
    }
}

/// エンコード済みバイト列を RGB 画像にデコード
pub fn decode(bytes: &[u8]) -> Result<RgbImage, CaptureError> {
    if bytes.is_empty() {
        return Err(CaptureError::DecodeFailure("empty image data".to_string()));
    }
    image::load_from_memory(bytes)
        .map(|decoded| decoded.to_rgb8())
        .map_err(|e| CaptureError::DecodeFailure(e.to_string()))
}

pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, WebcamError> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .encode_image(image)
        .map_err(|e| WebcamError::ImageProcessing(format!("JPEG encode failed: {e}")))?;
    Ok(buffer)
}

/// 回転または反転を1回だけ適用する
pub fn rotate(image: RgbImage, rotation: Rotation) -> RgbImage {
    match rotation {
        Rotation::None => image,
        // 角度は反時計回り、imageops は時計回り
        Rotation::Rotate90 => imageops::rotate270(&image),
        Rotation::Rotate180 => imageops::rotate180(&image),
        Rotation::Rotate270 => imageops::rotate90(&image),
        Rotation::FlipHorizontal => imageops::flip_vertical(&image),
        Rotation::FlipVertical => imageops::flip_horizontal(&image),
    }
}

/// BGR の画素列を RGB に並べ替える
pub fn bgr_to_rgb(input: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len());
    for chunk in input.chunks_exact(3) {
        output.extend_from_slice(&[chunk[2], chunk[1], chunk[0]]);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([(x as u8).wrapping_mul(40), (y as u8).wrapping_mul(60), 7]))
    }

    #[test]
    fn test_rotation_round_trip() {
        let original = gradient(3, 2);
        for rotation in [
            Rotation::None,
            Rotation::Rotate90,
            Rotation::Rotate180,
            Rotation::Rotate270,
            Rotation::FlipHorizontal,
            Rotation::FlipVertical,
        ] {
            let rotated = rotate(original.clone(), rotation);
            if rotation.swaps_axes() {
                assert_eq!(rotated.dimensions(), (2, 3), "{rotation}");
            } else {
                assert_eq!(rotated.dimensions(), (3, 2), "{rotation}");
            }
            let restored = rotate(rotated, rotation.inverse());
            assert_eq!(restored, original, "{rotation}");
        }
    }

    #[test]
    fn test_rotate_90_is_counter_clockwise() {
        let original = gradient(3, 2);
        let rotated = rotate(original.clone(), Rotation::Rotate90);
        // 右上の画素が左上に来る
        assert_eq!(rotated.get_pixel(0, 0), original.get_pixel(2, 0));
    }

    #[test]
    fn test_flip_directions() {
        let original = gradient(3, 2);
        let h = rotate(original.clone(), Rotation::FlipHorizontal);
        assert_eq!(h.get_pixel(0, 0), original.get_pixel(0, 1));
        let v = rotate(original.clone(), Rotation::FlipVertical);
        assert_eq!(v.get_pixel(0, 0), original.get_pixel(2, 0));
    }

    #[test]
    fn test_decode_round_trip_and_failures() {
        let bytes = encode_jpeg(&gradient(16, 8), 95).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (16, 8));

        assert!(matches!(decode(&[]), Err(CaptureError::DecodeFailure(_))));
        assert!(matches!(
            decode(b"definitely not an image"),
            Err(CaptureError::DecodeFailure(_))
        ));
    }

    #[test]
    fn test_bgr_to_rgb() {
        assert_eq!(bgr_to_rgb(&[1, 2, 3, 4, 5, 6]), vec![3, 2, 1, 6, 5, 4]);
    }
}
