//! Region extraction: select the image pixels under a binary mask.
//!
//! A mask may arrive at a different resolution than its photograph (the
//! UI draws on a scaled canvas). It is resized to the image's dimensions
//! with nearest-neighbor sampling, which only ever copies existing mask
//! values, so a zero/nonzero mask stays zero/nonzero after resizing.

use std::borrow::Cow;

use image::imageops::FilterType;
use image::{GrayImage, Rgb, RgbImage};

use crate::types::PipelineError;

/// Resize `mask` to `width` x `height` with nearest-neighbor sampling.
///
/// Returns the mask unchanged (borrowed) when it already matches.
#[must_use]
pub fn fit_mask(mask: &GrayImage, width: u32, height: u32) -> Cow<'_, GrayImage> {
    if mask.dimensions() == (width, height) {
        Cow::Borrowed(mask)
    } else {
        Cow::Owned(image::imageops::resize(
            mask,
            width,
            height,
            FilterType::Nearest,
        ))
    }
}

/// Pixels of `image` whose mask value is nonzero, in row-major order.
///
/// The mask is fitted to the image first, so the result never has more
/// entries than the image has pixels.
#[must_use]
pub fn select_pixels(image: &RgbImage, mask: &GrayImage) -> Vec<Rgb<u8>> {
    let fitted = fit_mask(mask, image.width(), image.height());
    image
        .pixels()
        .zip(fitted.pixels())
        .filter(|(_, m)| m.0[0] > 0)
        .map(|(p, _)| *p)
        .collect()
}

/// Select the masked pixels, treating an empty selection as an error.
///
/// # Errors
///
/// Returns [`PipelineError::NoPixelsSelected`] if no mask value is
/// nonzero after fitting.
pub fn extract_region(image: &RgbImage, mask: &GrayImage) -> Result<Vec<Rgb<u8>>, PipelineError> {
    let pixels = select_pixels(image, mask);
    if pixels.is_empty() {
        return Err(PipelineError::NoPixelsSelected);
    }
    Ok(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x4 image where every pixel encodes its own position.
    #[allow(clippy::cast_possible_truncation)]
    fn positional_image() -> RgbImage {
        RgbImage::from_fn(4, 4, |x, y| Rgb([x as u8, y as u8, 0]))
    }

    #[test]
    fn matching_mask_is_borrowed() {
        let mask = GrayImage::new(4, 4);
        assert!(matches!(fit_mask(&mask, 4, 4), Cow::Borrowed(_)));
    }

    #[test]
    fn resized_mask_matches_image() {
        let mask = GrayImage::new(2, 8);
        let fitted = fit_mask(&mask, 4, 4);
        assert_eq!(fitted.dimensions(), (4, 4));
    }

    #[test]
    fn nearest_resize_keeps_values_binary() {
        let mask = GrayImage::from_fn(3, 3, |x, y| {
            if (x + y) % 2 == 0 {
                image::Luma([255])
            } else {
                image::Luma([0])
            }
        });
        let fitted = fit_mask(&mask, 7, 5);
        for p in fitted.pixels() {
            assert!(p.0[0] == 0 || p.0[0] == 255, "got {}", p.0[0]);
        }
    }

    #[test]
    fn selects_only_masked_pixels() {
        let image = positional_image();
        let mask = GrayImage::from_fn(4, 4, |x, y| {
            if x == 2 && y < 2 {
                image::Luma([1])
            } else {
                image::Luma([0])
            }
        });
        let pixels = select_pixels(&image, &mask);
        assert_eq!(pixels, vec![Rgb([2, 0, 0]), Rgb([2, 1, 0])]);
    }

    #[test]
    fn upscaled_mask_selects_quadrant() {
        // 2x2 mask with only the top-left cell set covers the 2x2
        // top-left quadrant of a 4x4 image.
        let image = positional_image();
        let mask = GrayImage::from_fn(2, 2, |x, y| {
            if x == 0 && y == 0 {
                image::Luma([255])
            } else {
                image::Luma([0])
            }
        });
        let mut pixels = select_pixels(&image, &mask);
        pixels.sort_by_key(|p| (p.0[1], p.0[0]));
        assert_eq!(
            pixels,
            vec![
                Rgb([0, 0, 0]),
                Rgb([1, 0, 0]),
                Rgb([0, 1, 0]),
                Rgb([1, 1, 0]),
            ]
        );
    }

    #[test]
    fn full_mask_selects_every_pixel() {
        let image = positional_image();
        let mask = GrayImage::from_pixel(9, 9, image::Luma([200]));
        assert_eq!(select_pixels(&image, &mask).len(), 16);
    }

    #[test]
    fn empty_mask_is_an_error() {
        let image = positional_image();
        let mask = GrayImage::new(4, 4);
        assert!(select_pixels(&image, &mask).is_empty());
        assert!(matches!(
            extract_region(&image, &mask),
            Err(PipelineError::NoPixelsSelected)
        ));
    }
}
