//! Color space conversion between display sRGB, 8-bit encoded CIELAB,
//! and hexadecimal display codes.
//!
//! The CIELAB math (sRGB companding, D65 white point) is delegated to
//! the `palette` crate. This module only handles the 8-bit encoding used
//! throughout the pipeline:
//!
//! - `l = L* * 255 / 100`, so lightness spans `[0, 255]`
//! - `a = a* + 128` and `b = b* + 128`, so neutral gray sits at 128
//!
//! All functions are pure and total except [`hex_to_perceptual`], which
//! rejects malformed input.

use image::Rgb;
use palette::white_point::D65;
use palette::{FromColor, Lab, Srgb};

use crate::types::{LabColor, PipelineError};

/// Scale from CIE `L*` (`[0, 100]`) to the encoded lightness channel.
const L_SCALE: f64 = 255.0 / 100.0;

/// Convert one sRGB pixel to perceptual space.
#[must_use]
pub fn to_perceptual(pixel: Rgb<u8>) -> LabColor {
    let [r, g, b] = pixel.0;
    let srgb: Srgb<f64> = Srgb::new(r, g, b).into_format();
    let lab: Lab<D65, f64> = Lab::from_color(srgb);
    LabColor::new(
        lab.l * L_SCALE,
        lab.a + LabColor::NEUTRAL,
        lab.b + LabColor::NEUTRAL,
    )
}

/// Convert pixels to perceptual space, preserving count and order.
#[must_use]
pub fn pixels_to_perceptual(pixels: &[Rgb<u8>]) -> Vec<LabColor> {
    pixels.iter().copied().map(to_perceptual).collect()
}

/// Convert a perceptual color back to 8-bit sRGB.
///
/// Out-of-gamut colors are clamped channel-wise; channels are rounded to
/// the nearest integer.
#[must_use]
pub fn to_srgb(color: LabColor) -> Rgb<u8> {
    let lab = Lab::<D65, f64>::new(
        color.l() / L_SCALE,
        color.a() - LabColor::NEUTRAL,
        color.b() - LabColor::NEUTRAL,
    );
    let srgb = Srgb::<f64>::from_color(lab);
    Rgb([
        quantize(srgb.red),
        quantize(srgb.green),
        quantize(srgb.blue),
    ])
}

/// Format a perceptual color as an uppercase `#RRGGBB` display code.
#[must_use]
pub fn to_hex(color: LabColor) -> String {
    let Rgb([r, g, b]) = to_srgb(color);
    format!("#{r:02X}{g:02X}{b:02X}")
}

/// Parse a display code and convert it to perceptual space.
///
/// Accepts `#RRGGBB` or `RRGGBB` in either case; the three-digit
/// shorthand (`#RGB`) is also understood.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidHex`] if `hex` is not a valid code.
pub fn hex_to_perceptual(hex: &str) -> Result<LabColor, PipelineError> {
    let srgb: Srgb<u8> = hex
        .trim()
        .parse()
        .map_err(|e| PipelineError::InvalidHex(format!("{hex:?}: {e}")))?;
    Ok(to_perceptual(Rgb([srgb.red, srgb.green, srgb.blue])))
}

/// Euclidean distance between two perceptual colors.
#[must_use]
pub fn distance(a: LabColor, b: LabColor) -> f64 {
    a.distance(b)
}

/// Map a `[0, 1]` channel to `[0, 255]`, rounding and clamping.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantize(channel: f64) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}
