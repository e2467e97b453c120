//! Image and mask decoding.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces either an
//! RGB photograph or a single-channel mask. Alpha is discarded in both
//! cases; color masks are reduced to luma so any non-black pixel counts
//! as selected.

use image::{DynamicImage, GrayImage, RgbImage};

use crate::types::PipelineError;

/// Decode raw image bytes.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    Ok(image::load_from_memory(bytes)?)
}

/// Decode the base photograph as 8-bit sRGB.
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, PipelineError> {
    decode(bytes).map(|img| img.to_rgb8())
}

/// Decode a region mask as 8-bit luma.
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_mask(bytes: &[u8]) -> Result<GrayImage, PipelineError> {
    decode(bytes).map(|img| img.to_luma8())
}
