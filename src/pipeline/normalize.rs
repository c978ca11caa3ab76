//! Image normalisation: any `DynamicImage` → clean binary `GrayImage`.
//!
//! Tesseract is far more reliable on pure black/white input than on phone
//! photos with uneven lighting. The three steps below are unconditional:
//!
//! 1. Collapse colour channels to 8-bit luma.
//! 2. Global threshold at the Otsu level, so no per-document tuning is needed.
//! 3. Morphological closing with a single-pixel structuring element.
//!
//! There is no error path. A uniformly black or white page still yields a
//! (degenerate) binary image, which the recognizer reads as empty text.

use crate::config::ThresholdMode;
use image::{DynamicImage, GrayImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::morphology::close;
use tracing::debug;

/// Radius of the closing kernel. `0` is the 1×1 element: isolated-pixel
/// cleanup without thickening or thinning strokes.
const CLOSE_RADIUS: u8 = 0;

/// Binarise an image for OCR.
pub fn normalize_image(img: &DynamicImage, mode: ThresholdMode) -> GrayImage {
    let gray = img.to_luma8();
    let level = otsu_level(&gray);
    debug!(
        "Normalising {}x{} image, Otsu level {}",
        gray.width(),
        gray.height(),
        level
    );

    let threshold_type = match mode {
        ThresholdMode::Binary => ThresholdType::Binary,
        ThresholdMode::Inverse => ThresholdType::BinaryInverted,
    };
    let binary = threshold(&gray, level, threshold_type);

    close(&binary, Norm::LInf, CLOSE_RADIUS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    /// White page with a dark square in the top-left quadrant.
    fn page_with_ink() -> DynamicImage {
        let mut img = RgbImage::from_pixel(40, 40, Rgb([235, 230, 220]));
        for y in 0..20 {
            for x in 0..20 {
                img.put_pixel(x, y, Rgb([30, 25, 40]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn output_is_strictly_binary() {
        let out = normalize_image(&page_with_ink(), ThresholdMode::Binary);
        assert!(out.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn binary_mode_keeps_ink_dark() {
        let out = normalize_image(&page_with_ink(), ThresholdMode::Binary);
        assert_eq!(out.get_pixel(5, 5), &Luma([0]));
        assert_eq!(out.get_pixel(35, 35), &Luma([255]));
    }

    #[test]
    fn inverse_mode_flips_polarity() {
        let out = normalize_image(&page_with_ink(), ThresholdMode::Inverse);
        assert_eq!(out.get_pixel(5, 5), &Luma([255]));
        assert_eq!(out.get_pixel(35, 35), &Luma([0]));
    }

    #[test]
    fn dimensions_are_preserved() {
        let out = normalize_image(&page_with_ink(), ThresholdMode::Binary);
        assert_eq!(out.dimensions(), (40, 40));
    }

    #[test]
    fn uniform_image_is_still_binary() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([255])));
        let out = normalize_image(&img, ThresholdMode::Binary);
        assert!(out.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }
}
