//! Marker-region detection on rendered mockup images.
//!
//! The vendor renders a solid magenta artwork onto a product photo. The
//! rectangle that artwork occupies in the rendered image is where real
//! designs get composited later, so the detector classifies every pixel in
//! HSL space and returns the bounding box of the marker pixels as fractions
//! of the image dimensions.

pub mod area;
pub mod fetch;
pub mod hsl;

use image::RgbImage;
use thiserror::Error;

pub use area::PrintArea;
pub use fetch::{HttpImageFetcher, ImageFetcher};
pub use hsl::{is_marker, rgb_to_hsl, Hsl};

/// Errors from decoding or analyzing a rendered image.
#[derive(Error, Debug)]
pub enum DetectError {
    /// No pixel matched the marker color.
    #[error("No marker-colored region found in image")]
    NotFound,

    /// The decoded image has zero width or height.
    #[error("Image has no pixels")]
    EmptyImage,

    /// The bytes could not be decoded as an image.
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The rendered image could not be downloaded.
    #[error("Failed to fetch image '{url}': {reason}")]
    Fetch { url: String, reason: String },
}

/// Decodes `image_bytes` and locates the marker rectangle.
pub fn detect(image_bytes: &[u8]) -> Result<PrintArea, DetectError> {
    let _span = tracing::debug_span!("detect.decode", bytes = image_bytes.len()).entered();
    let rgb = image::load_from_memory(image_bytes)?.to_rgb8();
    detect_rgb(&rgb)
}

/// Locates the marker rectangle in an already decoded RGB buffer.
pub fn detect_rgb(image: &RgbImage) -> Result<PrintArea, DetectError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(DetectError::EmptyImage);
    }

    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        if !is_marker(rgb_to_hsl(r, g, b)) {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            }
        });
    }

    let (min_x, min_y, max_x, max_y) = bounds.ok_or(DetectError::NotFound)?;
    let (w, h) = (f64::from(width), f64::from(height));

    let area = PrintArea {
        x: f64::from(min_x) / w,
        y: f64::from(min_y) / h,
        width: f64::from(max_x - min_x + 1) / w,
        height: f64::from(max_y - min_y + 1) / h,
    };

    tracing::debug!(
        min_x,
        min_y,
        max_x,
        max_y,
        width,
        height,
        "Marker region located"
    );

    Ok(area)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb};
    use std::io::Cursor;

    const MAGENTA: Rgb<u8> = Rgb([255, 0, 255]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn canvas_with_block(w: u32, h: u32, block: (u32, u32, u32, u32), color: Rgb<u8>) -> RgbImage {
        let (bx, by, bw, bh) = block;
        RgbImage::from_fn(w, h, |x, y| {
            if x >= bx && x < bx + bw && y >= by && y < by + bh {
                color
            } else {
                WHITE
            }
        })
    }

    fn encode_png(image: RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn assert_close(actual: f64, expected: f64, pixels: u32) {
        let tolerance = 1.0 / f64::from(pixels);
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_exact_rectangle() {
        let image = canvas_with_block(200, 100, (20, 10, 100, 50), MAGENTA);
        let area = detect(&encode_png(image)).unwrap();

        assert_close(area.x, 0.1, 200);
        assert_close(area.y, 0.1, 100);
        assert_close(area.width, 0.5, 200);
        assert_close(area.height, 0.5, 100);
    }

    #[test]
    fn test_single_pixel_marker() {
        let image = canvas_with_block(10, 10, (9, 9, 1, 1), MAGENTA);
        let area = detect_rgb(&image).unwrap();

        assert_eq!(area.x, 0.9);
        assert_eq!(area.y, 0.9);
        assert_eq!(area.width, 0.1);
        assert_eq!(area.height, 0.1);
        assert!(area.x + area.width <= 1.0 + f64::EPSILON);
    }

    #[test]
    fn test_antialiased_border_is_included() {
        // Core block 10..30, one-pixel ring at 9 and 30 darkened to 40% (l = 0.2).
        let image = RgbImage::from_fn(40, 40, |x, y| {
            let inside = |lo: u32, hi: u32| x >= lo && x < hi && y >= lo && y < hi;
            if inside(10, 30) {
                MAGENTA
            } else if inside(9, 31) {
                Rgb([102, 0, 102])
            } else {
                WHITE
            }
        });
        let area = detect_rgb(&image).unwrap();

        assert_eq!(area.x, 9.0 / 40.0);
        assert_eq!(area.width, 22.0 / 40.0);
    }

    #[test]
    fn test_dark_fringe_below_lightness_floor_is_excluded() {
        // Ring darkened to 20% (l = 0.1) must not widen the box.
        let image = RgbImage::from_fn(40, 40, |x, y| {
            let inside = |lo: u32, hi: u32| x >= lo && x < hi && y >= lo && y < hi;
            if inside(10, 30) {
                MAGENTA
            } else if inside(8, 32) {
                Rgb([51, 0, 51])
            } else {
                WHITE
            }
        });
        let area = detect_rgb(&image).unwrap();

        assert_eq!(area.x, 10.0 / 40.0);
        assert_eq!(area.y, 10.0 / 40.0);
        assert_eq!(area.width, 20.0 / 40.0);
        assert_eq!(area.height, 20.0 / 40.0);
    }

    #[test]
    fn test_no_marker_is_not_found() {
        let image = canvas_with_block(50, 50, (5, 5, 20, 20), Rgb([0, 0, 255]));
        let err = detect(&encode_png(image)).unwrap_err();
        assert!(matches!(err, DetectError::NotFound));
    }

    #[test]
    fn test_blank_image_is_not_found() {
        let image = RgbImage::from_pixel(16, 16, WHITE);
        assert!(matches!(detect_rgb(&image), Err(DetectError::NotFound)));
    }

    #[test]
    fn test_empty_image() {
        let image = RgbImage::new(0, 0);
        assert!(matches!(detect_rgb(&image), Err(DetectError::EmptyImage)));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let err = detect(b"definitely not an image").unwrap_err();
        assert!(matches!(err, DetectError::Decode(_)));
    }
}
