//! Letterbox normalization of a captured image into the square canonical frame
//! sent to the detection service.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgb, RgbImage};

use crate::capture::CapturedImage;
use crate::error::DetectionError;
use crate::geometry::LetterboxTransform;

/// Default side length of the canonical frame, in pixels.
pub const DEFAULT_FRAME_SIDE: u32 = 640;

/// Fill colour of the letterbox bars.
pub const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

/// Square `side`×`side` RGB frame plus the transform that placed the source in it.
#[derive(Debug, Clone)]
pub struct CanonicalFrame {
    pixels: RgbImage,
    transform: LetterboxTransform,
}

impl CanonicalFrame {
    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn transform(&self) -> &LetterboxTransform {
        &self.transform
    }

    pub fn side(&self) -> u32 {
        self.pixels.width()
    }

    /// Encode the frame as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, DetectionError> {
        let mut buf = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(DetectionError::Encoding)?;
        Ok(buf)
    }
}

/// Scale `image` to fit a `side`×`side` black canvas, preserving aspect ratio
/// and centring it along the axis with slack.
pub fn normalize(image: &CapturedImage, side: u32) -> Result<CanonicalFrame, DetectionError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(DetectionError::InvalidImage(format!(
            "image has zero dimension ({width}x{height})"
        )));
    }

    let transform = LetterboxTransform::fit(width as f64, height as f64, side as f64)?;
    let (scaled_w, scaled_h) = transform.scaled_size();
    // Pixel grid is integral: round the drawn size, keep it within the canvas.
    let draw_w = (scaled_w.round() as u32).clamp(1, side);
    let draw_h = (scaled_h.round() as u32).clamp(1, side);
    let offset_x = (side - draw_w) / 2;
    let offset_y = (side - draw_h) / 2;

    let source = image.upright().to_rgb8();
    let resized = if (draw_w, draw_h) == (width, height) {
        source
    } else {
        imageops::resize(&source, draw_w, draw_h, FilterType::Triangle)
    };

    let mut canvas = RgbImage::from_pixel(side, side, BACKGROUND);
    imageops::overlay(&mut canvas, &resized, offset_x as i64, offset_y as i64);

    tracing::debug!(
        width,
        height,
        side,
        scale = transform.scale,
        offset_x,
        offset_y,
        "normalized image into canonical frame"
    );

    Ok(CanonicalFrame {
        pixels: canvas,
        transform,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Orientation;
    use image::DynamicImage;

    fn solid(width: u32, height: u32) -> CapturedImage {
        CapturedImage::new(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb([255, 0, 0]),
        )))
    }

    fn is_red(p: &Rgb<u8>) -> bool {
        p[0] > 250 && p[1] < 5 && p[2] < 5
    }

    fn is_background(p: &Rgb<u8>) -> bool {
        *p == BACKGROUND
    }

    #[test]
    fn test_output_is_always_square() {
        for &(w, h) in &[(1, 1), (3000, 20), (20, 3000), (640, 640), (1920, 1080)] {
            let frame = normalize(&solid(w, h), 64).unwrap();
            assert_eq!(frame.pixels().dimensions(), (64, 64), "{w}x{h}");
            assert_eq!(frame.side(), 64);
        }
    }

    #[test]
    fn test_landscape_bars_top_and_bottom() {
        // 200x100 → 64x32 drawn at y = 16
        let frame = normalize(&solid(200, 100), 64).unwrap();
        let px = frame.pixels();
        for y in 0..64 {
            for x in 0..64 {
                let p = px.get_pixel(x, y);
                if (16..48).contains(&y) {
                    assert!(is_red(p), "({x},{y}) = {p:?}");
                } else {
                    assert!(is_background(p), "({x},{y}) = {p:?}");
                }
            }
        }
    }

    #[test]
    fn test_portrait_bars_left_and_right() {
        // 100x400 → 16x64 drawn at x = 24
        let frame = normalize(&solid(100, 400), 64).unwrap();
        let px = frame.pixels();
        for y in 0..64 {
            for x in 0..64 {
                let p = px.get_pixel(x, y);
                if (24..40).contains(&x) {
                    assert!(is_red(p), "({x},{y}) = {p:?}");
                } else {
                    assert!(is_background(p), "({x},{y}) = {p:?}");
                }
            }
        }
        let t = frame.transform();
        assert!((t.tx - 24.0).abs() < 1e-9);
        assert_eq!(t.ty, 0.0);
    }

    #[test]
    fn test_upscales_small_images() {
        let frame = normalize(&solid(8, 8), 64).unwrap();
        assert!(frame.pixels().pixels().all(is_red));
        assert!((frame.transform().scale - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_uses_upright_size() {
        // Stored 100x400, displayed 400x100 → bars top and bottom.
        let img = CapturedImage::with_orientation(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 400, Rgb([255, 0, 0]))),
            Orientation::Rotate270,
        );
        let frame = normalize(&img, 64).unwrap();
        assert!(is_background(frame.pixels().get_pixel(32, 0)));
        assert!(is_red(frame.pixels().get_pixel(32, 32)));
        assert!((frame.transform().source_width - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_empty_image() {
        let img = CapturedImage::new(DynamicImage::new_rgb8(0, 10));
        let err = normalize(&img, 64).unwrap_err();
        assert!(matches!(err, DetectionError::InvalidImage(_)));
    }

    #[test]
    fn test_rejects_zero_side() {
        let err = normalize(&solid(10, 10), 0).unwrap_err();
        assert!(matches!(err, DetectionError::InvalidImage(_)));
    }

    #[test]
    fn test_png_decodes_back_to_frame() {
        let frame = normalize(&solid(30, 10), 32).unwrap();
        let png = frame.encode_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(&decoded, frame.pixels());
    }
}
