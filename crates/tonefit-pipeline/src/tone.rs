//! Tone classification: depth and undertone labels from a representative
//! perceptual color.
//!
//! Both classifiers are fixed threshold rules over the 8-bit encoded
//! CIELAB channels (see [`crate::color`]). The thresholds below are the
//! classification boundaries; every one of them is exercised by the
//! boundary tests at the bottom of this module.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::LabColor;

/// Lower bound (exclusive) of [`Depth::VeryFair`].
pub const VERY_FAIR_ABOVE: f64 = 200.0;
/// Lower bound (inclusive) of [`Depth::Fair`].
pub const FAIR_FROM: f64 = 170.0;
/// Lower bound (inclusive) of [`Depth::Wheatish`].
pub const WHEATISH_FROM: f64 = 140.0;
/// Lower bound (inclusive) of [`Depth::Dusky`]; anything darker is
/// [`Depth::Deep`].
pub const DUSKY_FROM: f64 = 100.0;

/// Olive requires the centered `a` channel strictly below this.
pub const OLIVE_MAX_A: f64 = 0.0;
/// Olive requires the centered `b` channel strictly above this.
pub const OLIVE_MIN_B: f64 = 5.0;
/// Warm when centered `b` exceeds centered `a` by more than this.
pub const WARM_MARGIN: f64 = 3.0;
/// Cool when centered `a` exceeds centered `b` by more than this.
pub const COOL_MARGIN: f64 = 2.0;

/// Ordered lightness band, lightest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Depth {
    /// `l > 200`.
    #[serde(rename = "Very Fair")]
    VeryFair,
    /// `170 <= l <= 200`.
    Fair,
    /// `140 <= l < 170`.
    Wheatish,
    /// `100 <= l < 140`.
    Dusky,
    /// `l < 100`.
    Deep,
}

impl Depth {
    /// All bands, lightest first.
    pub const ALL: [Self; 5] = [
        Self::VeryFair,
        Self::Fair,
        Self::Wheatish,
        Self::Dusky,
        Self::Deep,
    ];

    /// Classify an encoded lightness value.
    ///
    /// Total over all `f64`: values outside `[0, 255]` fall into the
    /// outermost bands and `NaN` is treated as [`Depth::Deep`].
    #[must_use]
    pub fn from_lightness(l: f64) -> Self {
        if l > VERY_FAIR_ABOVE {
            Self::VeryFair
        } else if l >= FAIR_FROM {
            Self::Fair
        } else if l >= WHEATISH_FROM {
            Self::Wheatish
        } else if l >= DUSKY_FROM {
            Self::Dusky
        } else {
            Self::Deep
        }
    }

    /// Display label, e.g. `"Very Fair"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryFair => "Very Fair",
            Self::Fair => "Fair",
            Self::Wheatish => "Wheatish",
            Self::Dusky => "Dusky",
            Self::Deep => "Deep",
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Chromatic bias of a color, independent of lightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Undertone {
    /// Yellow bias.
    Warm,
    /// Red/pink bias.
    Cool,
    /// Greenish-yellow bias.
    Olive,
    /// No clear bias.
    Neutral,
}

impl Undertone {
    /// Classify from the chroma channels of an encoded color.
    ///
    /// Rules are checked in order; the first match wins:
    ///
    /// 1. Olive: `a' < OLIVE_MAX_A` and `b' > OLIVE_MIN_B`
    /// 2. Warm: `b' > a' + WARM_MARGIN`
    /// 3. Cool: `a' > b' + COOL_MARGIN`
    /// 4. Neutral
    ///
    /// where `a' = a - 128` and `b' = b - 128`.
    #[must_use]
    pub fn from_color(color: LabColor) -> Self {
        let a = color.a() - LabColor::NEUTRAL;
        let b = color.b() - LabColor::NEUTRAL;

        if a < OLIVE_MAX_A && b > OLIVE_MIN_B {
            Self::Olive
        } else if b > a + WARM_MARGIN {
            Self::Warm
        } else if a > b + COOL_MARGIN {
            Self::Cool
        } else {
            Self::Neutral
        }
    }

    /// Display label, e.g. `"Warm"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Warm => "Warm",
            Self::Cool => "Cool",
            Self::Olive => "Olive",
            Self::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Undertone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Depth and undertone of one representative color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tone {
    /// Lightness band.
    pub depth: Depth,
    /// Chromatic bias.
    pub undertone: Undertone,
}

impl Tone {
    /// Classify a representative color.
    #[must_use]
    pub fn classify(color: LabColor) -> Self {
        Self {
            depth: Depth::from_lightness(color.l()),
            undertone: Undertone::from_color(color),
        }
    }

    /// Sentence summarizing the classification.
    #[must_use]
    pub fn explanation(self) -> String {
        format!(
            "Based on {} skin depth and {} undertone.",
            self.depth, self.undertone
        )
    }
}
