//! Palette scoring: rank catalog candidates by perceptual similarity to
//! a representative color.

use crate::catalog::{self, Candidate};
use crate::color;
use crate::tone::{Depth, Undertone};
use crate::types::{LabColor, PipelineError, RecommendedColor};

/// Perceptual distance at which similarity reaches 0%.
pub const SIMILARITY_MAX_DISTANCE: f64 = 120.0;

/// Round to one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Similarity between two colors as a percentage.
///
/// Linear in perceptual distance: 100 at distance 0, 0 at
/// [`SIMILARITY_MAX_DISTANCE`] and beyond. Rounded to one decimal.
#[must_use]
pub fn similarity(a: LabColor, b: LabColor) -> f64 {
    let score = 100.0 - a.distance(b) / SIMILARITY_MAX_DISTANCE * 100.0;
    round1(score.clamp(0.0, 100.0))
}

/// A candidate with a score, before conversion to the public type.
pub(crate) struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: f64,
}

impl ScoredCandidate {
    pub fn into_recommendation(self) -> RecommendedColor {
        RecommendedColor {
            name: self.candidate.color.name.to_owned(),
            hex: self.candidate.color.hex.to_owned(),
            match_percentage: self.score,
        }
    }
}

/// Sort by descending score; equal scores keep catalog order.
pub(crate) fn rank(mut scored: Vec<ScoredCandidate>) -> Vec<RecommendedColor> {
    scored.sort_by(|x, y| {
        y.score
            .total_cmp(&x.score)
            .then(x.candidate.catalog_index.cmp(&y.candidate.catalog_index))
    });
    scored.into_iter().map(ScoredCandidate::into_recommendation).collect()
}

/// Perceptual color of a catalog candidate.
pub(crate) fn candidate_color(candidate: &Candidate) -> Result<LabColor, PipelineError> {
    color::hex_to_perceptual(candidate.color.hex)
}

/// Ranked recommendations for a classified representative color.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidHex`] if a catalog entry cannot be
/// parsed; the catalog tests make this unreachable in practice.
pub fn recommend(
    representative: LabColor,
    depth: Depth,
    undertone: Undertone,
) -> Result<Vec<RecommendedColor>, PipelineError> {
    let scored = catalog::candidates(Some(depth), undertone)
        .into_iter()
        .map(|candidate| {
            let lab = candidate_color(&candidate)?;
            Ok(ScoredCandidate {
                candidate,
                score: similarity(representative, lab),
            })
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;
    Ok(rank(scored))
}
