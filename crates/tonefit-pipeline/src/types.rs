//! Shared types for the tonefit analysis pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cluster::ClustererKind;
use crate::tone::{Depth, Undertone};

/// Re-export `RgbImage` so downstream crates can hold a decoded base
/// image without depending on `image` directly.
pub use image::RgbImage;

/// Re-export `GrayImage` for decoded region masks.
pub use image::GrayImage;

/// One of the three body regions a mask can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// Hair region.
    Hair,
    /// Facial skin region.
    Skin,
    /// Hand or wrist region.
    Hand,
}

impl Region {
    /// Fixed evaluation order used when combining regions and breaking
    /// undertone vote ties.
    pub const EVALUATION_ORDER: [Self; 3] = [Self::Skin, Self::Hair, Self::Hand];

    /// Nominal weight of this region before renormalization.
    #[must_use]
    pub const fn nominal_weight(self) -> f64 {
        match self {
            Self::Skin => 0.5,
            Self::Hair => 0.3,
            Self::Hand => 0.2,
        }
    }

    /// Lowercase label used on the wire.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hair => "hair",
            Self::Skin => "skin",
            Self::Hand => "hand",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Region {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hair" => Ok(Self::Hair),
            "skin" => Ok(Self::Skin),
            "hand" => Ok(Self::Hand),
            other => Err(PipelineError::UnknownRegion(other.to_owned())),
        }
    }
}

/// A color in the 8-bit encoded CIELAB space.
///
/// `l` spans `[0, 255]` (`L* * 255 / 100`); `a` and `b` are offset so
/// that the zero-chroma origin sits at [`LabColor::NEUTRAL`]. Values are
/// kept as `f64` so cluster centroids and weighted averages are not
/// quantized.
///
/// There is no public constructor: colors come from the conversions in
/// [`crate::color`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabColor {
    l: f64,
    a: f64,
    b: f64,
}

impl LabColor {
    /// Encoded value of the zero-chroma origin on both chroma axes.
    pub const NEUTRAL: f64 = 128.0;

    pub(crate) const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    /// Lightness channel, `[0, 255]`.
    #[must_use]
    pub const fn l(self) -> f64 {
        self.l
    }

    /// Green-red chroma channel, neutral at 128.
    #[must_use]
    pub const fn a(self) -> f64 {
        self.a
    }

    /// Blue-yellow chroma channel, neutral at 128.
    #[must_use]
    pub const fn b(self) -> f64 {
        self.b
    }

    /// Components as an `[l, a, b]` array.
    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.l, self.a, self.b]
    }

    /// Squared Euclidean distance to another color.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;
        dl.mul_add(dl, da.mul_add(da, db * db))
    }

    /// Euclidean distance to another color.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Weighted mean of colors. Returns `None` when the weights sum to
    /// zero or the input is empty.
    pub(crate) fn weighted_mean(colors: impl IntoIterator<Item = (Self, f64)>) -> Option<Self> {
        let mut sum = [0.0_f64; 3];
        let mut total = 0.0;
        for (color, weight) in colors {
            sum[0] = color.l.mul_add(weight, sum[0]);
            sum[1] = color.a.mul_add(weight, sum[1]);
            sum[2] = color.b.mul_add(weight, sum[2]);
            total += weight;
        }
        (total > 0.0).then(|| Self::new(sum[0] / total, sum[1] / total, sum[2] / total))
    }
}

impl Serialize for LabColor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_array().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LabColor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [l, a, b] = <[f64; 3]>::deserialize(deserializer)?;
        Ok(Self::new(l, a, b))
    }
}

/// A catalog color recommended for a region, with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedColor {
    /// Catalog name, e.g. `"Navy"`.
    pub name: String,
    /// Display code, e.g. `"#000080"`.
    pub hex: String,
    /// Similarity to the representative color, `[0, 100]`, one decimal.
    pub match_percentage: f64,
}

/// Analysis of a single masked region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionAnalysis {
    /// Which region was analyzed.
    pub region: Region,
    /// Lightness band of the representative color.
    #[serde(rename = "raw_depth")]
    pub depth: Depth,
    /// Chromatic bias of the representative color.
    #[serde(rename = "raw_undertone")]
    pub undertone: Undertone,
    /// Representative color in perceptual space.
    #[serde(rename = "representative_lab")]
    pub lab: LabColor,
    /// Representative color as a display code.
    #[serde(rename = "representative_color")]
    pub hex: String,
    /// Ranked recommendations, best match first.
    #[serde(rename = "recommended_colors")]
    pub recommendations: Vec<RecommendedColor>,
    /// Human-readable summary.
    pub explanation: String,
}

/// Per-region result: an analysis or an error object.
///
/// Serializes untagged, so a failure is exactly `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegionOutcome {
    /// The region was analyzed.
    Analyzed(RegionAnalysis),
    /// The region could not be analyzed.
    Failed {
        /// Display text of the underlying [`PipelineError`].
        error: String,
    },
}

impl RegionOutcome {
    /// The analysis, if the region succeeded.
    #[must_use]
    pub const fn analysis(&self) -> Option<&RegionAnalysis> {
        match self {
            Self::Analyzed(analysis) => Some(analysis),
            Self::Failed { .. } => None,
        }
    }

    /// The error text, if the region failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Analyzed(_) => None,
            Self::Failed { error } => Some(error),
        }
    }
}

impl From<Result<RegionAnalysis, PipelineError>> for RegionOutcome {
    fn from(result: Result<RegionAnalysis, PipelineError>) -> Self {
        match result {
            Ok(analysis) => Self::Analyzed(analysis),
            Err(e) => Self::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Normalized weight applied to one region during combination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionWeight {
    /// The region.
    pub region: Region,
    /// Weight after renormalization over present regions.
    pub weight: f64,
}

/// Weighted merge of all successfully analyzed regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedAnalysis {
    /// Majority undertone across present regions.
    pub overall_undertone: Undertone,
    /// Weight-averaged representative color as a display code.
    pub representative_color: String,
    /// Regions that contributed, in evaluation order.
    pub regions_analyzed: Vec<Region>,
    /// Weights actually applied, in evaluation order.
    pub weights: Vec<RegionWeight>,
    /// Ranked recommendations by weighted score.
    pub recommended_colors: Vec<RecommendedColor>,
    /// Human-readable summary.
    pub explanation: String,
}

/// Combined result: an analysis or an error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CombinedOutcome {
    /// At least one region was combined.
    Combined(CombinedAnalysis),
    /// Nothing could be combined.
    Failed {
        /// Display text of the underlying [`PipelineError`].
        error: String,
    },
}

impl CombinedOutcome {
    /// The combined analysis, if any region contributed.
    #[must_use]
    pub const fn analysis(&self) -> Option<&CombinedAnalysis> {
        match self {
            Self::Combined(analysis) => Some(analysis),
            Self::Failed { .. } => None,
        }
    }
}

impl From<Result<CombinedAnalysis, PipelineError>> for CombinedOutcome {
    fn from(result: Result<CombinedAnalysis, PipelineError>) -> Self {
        match result {
            Ok(analysis) => Self::Combined(analysis),
            Err(e) => Self::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Encoded inputs for one analysis request.
///
/// Masks are optional; a region without a mask is simply not analyzed.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisRequest<'a> {
    /// Encoded base photograph (PNG, JPEG, BMP, WebP).
    pub image: &'a [u8],
    /// Encoded hair mask.
    pub hair_mask: Option<&'a [u8]>,
    /// Encoded skin mask.
    pub skin_mask: Option<&'a [u8]>,
    /// Encoded hand mask.
    pub hand_mask: Option<&'a [u8]>,
}

impl<'a> AnalysisRequest<'a> {
    /// Mask bytes for a region, if supplied.
    #[must_use]
    pub const fn mask(&self, region: Region) -> Option<&'a [u8]> {
        match region {
            Region::Hair => self.hair_mask,
            Region::Skin => self.skin_mask,
            Region::Hand => self.hand_mask,
        }
    }
}

/// Everything produced for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Always `"success"`; failures are reported per region.
    pub status: String,
    /// Hair outcome, absent when no hair mask was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hair: Option<RegionOutcome>,
    /// Skin outcome, absent when no skin mask was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin: Option<RegionOutcome>,
    /// Hand outcome, absent when no hand mask was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand: Option<RegionOutcome>,
    /// Weighted merge of the successful regions.
    pub combined_analysis: CombinedOutcome,
}

impl AnalysisResponse {
    /// Outcome for a region, if its mask was supplied.
    #[must_use]
    pub const fn outcome(&self, region: Region) -> Option<&RegionOutcome> {
        match region {
            Region::Hair => self.hair.as_ref(),
            Region::Skin => self.skin.as_ref(),
            Region::Hand => self.hand.as_ref(),
        }
    }
}

/// Configuration for the analysis pipeline.
///
/// Classification thresholds and scoring constants are fixed `const`s
/// in their modules; only clustering behavior is configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Seed for pixel sampling and cluster initialization. The same
    /// photograph and seed always yield the same representative color.
    pub seed: u64,

    /// Requested number of clusters. Reduced to `max(1, n / 2)` when a
    /// region has fewer than this many samples.
    pub clusters: usize,

    /// Number of independently seeded clustering runs; the run with the
    /// lowest inertia wins.
    pub restarts: usize,

    /// Maximum centroid-relocation iterations per run.
    pub max_iterations: usize,

    /// Convergence threshold on the largest centroid shift.
    pub tolerance: f64,

    /// Cap on the clustering working set. Larger regions are sampled
    /// uniformly without replacement.
    pub max_samples: usize,

    /// Which clustering algorithm to use.
    pub clusterer: ClustererKind,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            clusters: 5,
            restarts: 10,
            max_iterations: 300,
            tolerance: 1e-4,
            max_samples: 5000,
            clusterer: ClustererKind::default(),
        }
    }
}

impl AnalysisConfig {
    /// Check that every field is usable.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first
    /// offending field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let zero_field = [
            ("clusters", self.clusters),
            ("restarts", self.restarts),
            ("max_iterations", self.max_iterations),
            ("max_samples", self.max_samples),
        ]
        .into_iter()
        .find(|&(_, value)| value == 0);
        if let Some((name, _)) = zero_field {
            return Err(PipelineError::InvalidConfig(format!(
                "{name} must be at least 1"
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Errors that can occur during analysis.
///
/// Uses custom `Serialize`/`Deserialize` because `image::ImageError`
/// does not implement serde traits. The `ImageDecode` variant is
/// serialized as its `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode an image or mask.
    #[error("Invalid image file: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// Image or mask bytes were empty.
    #[error("Invalid image file: input is empty")]
    EmptyInput,

    /// The mask decoded but selected no pixels.
    #[error("No pixels selected!")]
    NoPixelsSelected,

    /// A display code could not be parsed.
    #[error("invalid hex color code: {0}")]
    InvalidHex(String),

    /// A region label was not one of `hair`, `skin`, `hand`.
    #[error("unknown region type: {0}")]
    UnknownRegion(String),

    /// Analysis configuration is invalid.
    #[error("invalid analysis configuration: {0}")]
    InvalidConfig(String),

    /// Every region was absent or failed.
    #[error("No valid regions to combine")]
    NothingToCombine,
}

impl PipelineError {
    /// Whether this error means the input bytes were not a usable image,
    /// as opposed to a mask that decoded but selected nothing.
    #[must_use]
    pub const fn is_decode_failure(&self) -> bool {
        matches!(self, Self::ImageDecode(_) | Self::EmptyInput)
    }
}

/// Serde-compatible proxy for `PipelineError`.
#[derive(Serialize, Deserialize)]
enum PipelineErrorProxy {
    ImageDecode(String),
    EmptyInput,
    NoPixelsSelected,
    InvalidHex(String),
    UnknownRegion(String),
    InvalidConfig(String),
    NothingToCombine,
}

impl Serialize for PipelineError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::ImageDecode(e) => PipelineErrorProxy::ImageDecode(e.to_string()),
            Self::EmptyInput => PipelineErrorProxy::EmptyInput,
            Self::NoPixelsSelected => PipelineErrorProxy::NoPixelsSelected,
            Self::InvalidHex(s) => PipelineErrorProxy::InvalidHex(s.clone()),
            Self::UnknownRegion(s) => PipelineErrorProxy::UnknownRegion(s.clone()),
            Self::InvalidConfig(s) => PipelineErrorProxy::InvalidConfig(s.clone()),
            Self::NothingToCombine => PipelineErrorProxy::NothingToCombine,
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PipelineError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = PipelineErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            // The typed image error cannot be rebuilt; keep its message.
            PipelineErrorProxy::ImageDecode(msg) => Self::ImageDecode(
                image::ImageError::IoError(std::io::Error::other(msg)),
            ),
            PipelineErrorProxy::EmptyInput => Self::EmptyInput,
            PipelineErrorProxy::NoPixelsSelected => Self::NoPixelsSelected,
            PipelineErrorProxy::InvalidHex(s) => Self::InvalidHex(s),
            PipelineErrorProxy::UnknownRegion(s) => Self::UnknownRegion(s),
            PipelineErrorProxy::InvalidConfig(s) => Self::InvalidConfig(s),
            PipelineErrorProxy::NothingToCombine => Self::NothingToCombine,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Region tests ---

    #[test]
    fn nominal_weights_sum_to_one() {
        let total: f64 = Region::EVALUATION_ORDER
            .iter()
            .map(|r| r.nominal_weight())
            .sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn region_parses_case_insensitively() {
        assert_eq!("Skin".parse::<Region>().unwrap(), Region::Skin);
        assert_eq!(" hair ".parse::<Region>().unwrap(), Region::Hair);
        assert_eq!("HAND".parse::<Region>().unwrap(), Region::Hand);
        assert!(matches!(
            "face".parse::<Region>(),
            Err(PipelineError::UnknownRegion(_))
        ));
    }

    #[test]
    fn region_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Region::Hand).unwrap(), "\"hand\"");
    }

    // --- LabColor tests ---

    #[test]
    fn lab_distance() {
        let a = LabColor::new(0.0, 0.0, 0.0);
        let b = LabColor::new(2.0, 3.0, 6.0);
        assert!((a.distance(b) - 7.0).abs() < 1e-12);
        assert!(a.distance(a).abs() < f64::EPSILON);
    }

    #[test]
    fn lab_weighted_mean() {
        let mean = LabColor::weighted_mean([
            (LabColor::new(100.0, 120.0, 140.0), 0.75),
            (LabColor::new(200.0, 140.0, 100.0), 0.25),
        ])
        .unwrap();
        assert!((mean.l() - 125.0).abs() < 1e-9);
        assert!((mean.a() - 125.0).abs() < 1e-9);
        assert!((mean.b() - 130.0).abs() < 1e-9);
    }

    #[test]
    fn lab_weighted_mean_of_nothing_is_none() {
        assert!(LabColor::weighted_mean(std::iter::empty()).is_none());
        assert!(LabColor::weighted_mean([(LabColor::new(1.0, 2.0, 3.0), 0.0)]).is_none());
    }

    #[test]
    fn lab_serializes_as_array() {
        let lab = LabColor::new(180.0, 128.0, 140.0);
        let json = serde_json::to_string(&lab).unwrap();
        assert_eq!(json, "[180.0,128.0,140.0]");
        let back: LabColor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, lab);
    }

    // --- Outcome tests ---

    #[test]
    fn failed_outcome_is_bare_error_object() {
        let outcome = RegionOutcome::from(Err(PipelineError::NoPixelsSelected));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "No pixels selected!" }));
        assert!(outcome.analysis().is_none());
        assert_eq!(outcome.error(), Some("No pixels selected!"));
    }

    #[test]
    fn failed_outcome_deserializes_back() {
        let outcome: RegionOutcome =
            serde_json::from_str(r#"{"error": "No pixels selected!"}"#).unwrap();
        assert_eq!(
            outcome,
            RegionOutcome::Failed {
                error: "No pixels selected!".to_owned()
            }
        );
    }

    // --- AnalysisConfig tests ---

    #[test]
    fn config_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.clusters, 5);
        assert_eq!(config.restarts, 10);
        assert_eq!(config.max_samples, 5000);
        assert_eq!(config.clusterer, ClustererKind::KMeans);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_zero_clusters() {
        let config = AnalysisConfig {
            clusters: 0,
            ..AnalysisConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(ref m) if m.contains("clusters")));
    }

    #[test]
    fn config_rejects_nan_tolerance() {
        let config = AnalysisConfig {
            tolerance: f64::NAN,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn config_partial_json_fills_defaults() {
        let config: AnalysisConfig = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.clusters, 5);
    }

    // --- PipelineError tests ---

    #[test]
    fn decode_failures_are_distinguishable() {
        assert!(PipelineError::EmptyInput.is_decode_failure());
        assert!(!PipelineError::NoPixelsSelected.is_decode_failure());
    }

    #[test]
    fn error_serde_round_trip_preserves_variant() {
        let json = serde_json::to_string(&PipelineError::NothingToCombine).unwrap();
        let back: PipelineError = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, PipelineError::NothingToCombine));
    }
}
