//! Multi-region combination: merge per-region analyses into one weighted
//! recommendation.
//!
//! Regions are always visited in [`Region::EVALUATION_ORDER`], so the
//! result depends only on which regions succeeded, never on the order in
//! which their analyses finished.

use crate::catalog;
use crate::color;
use crate::recommend::{self, ScoredCandidate};
use crate::tone::Undertone;
use crate::types::{
    CombinedAnalysis, LabColor, PipelineError, Region, RegionAnalysis, RegionOutcome,
    RegionWeight,
};

/// Nominal weights of `present` regions, renormalized to sum to 1.0.
///
/// Order follows `present`. Returns an empty list for no regions.
#[must_use]
pub fn normalized_weights(present: &[Region]) -> Vec<RegionWeight> {
    let total: f64 = present.iter().map(|r| r.nominal_weight()).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    present
        .iter()
        .map(|&region| RegionWeight {
            region,
            weight: region.nominal_weight() / total,
        })
        .collect()
}

/// Most common undertone. A tie goes to whichever tied label appears
/// first in `undertones`.
#[must_use]
pub fn majority_undertone(undertones: &[Undertone]) -> Option<Undertone> {
    let mut tally: Vec<(Undertone, usize)> = Vec::new();
    for &u in undertones {
        match tally.iter_mut().find(|(seen, _)| *seen == u) {
            Some((_, count)) => *count += 1,
            None => tally.push((u, 1)),
        }
    }
    // `tally` is in first-seen order; keep the earliest on equal counts.
    tally
        .into_iter()
        .fold(None, |best: Option<(Undertone, usize)>, (u, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((u, count)),
        })
        .map(|(u, _)| u)
}

/// Merge whichever regions were analyzed successfully.
///
/// Absent (`None`) and failed regions are skipped. Candidates come from
/// the catalog rules that do not depend on depth; each is scored by the
/// weighted sum of its per-region similarities.
///
/// # Errors
///
/// Returns [`PipelineError::NothingToCombine`] when no region succeeded.
pub fn combine(
    hair: Option<&RegionOutcome>,
    skin: Option<&RegionOutcome>,
    hand: Option<&RegionOutcome>,
) -> Result<CombinedAnalysis, PipelineError> {
    let pick = |region| match region {
        Region::Hair => hair,
        Region::Skin => skin,
        Region::Hand => hand,
    };
    let present: Vec<(Region, &RegionAnalysis)> = Region::EVALUATION_ORDER
        .into_iter()
        .filter_map(|region| Some((region, pick(region)?.analysis()?)))
        .collect();
    combine_analyses(&present)
}

/// [`combine`] over analyses already filtered to the successful ones, in
/// evaluation order.
///
/// # Errors
///
/// Returns [`PipelineError::NothingToCombine`] when `present` is empty.
pub fn combine_analyses(
    present: &[(Region, &RegionAnalysis)],
) -> Result<CombinedAnalysis, PipelineError> {
    let regions: Vec<Region> = present.iter().map(|(r, _)| *r).collect();
    let weights = normalized_weights(&regions);
    if weights.is_empty() {
        return Err(PipelineError::NothingToCombine);
    }

    let undertones: Vec<Undertone> = present.iter().map(|(_, a)| a.undertone).collect();
    let overall_undertone =
        majority_undertone(&undertones).ok_or(PipelineError::NothingToCombine)?;

    let weighted_reps: Vec<(LabColor, f64)> = present
        .iter()
        .zip(&weights)
        .map(|((_, analysis), w)| (analysis.lab, w.weight))
        .collect();
    let representative = LabColor::weighted_mean(weighted_reps.iter().copied())
        .ok_or(PipelineError::NothingToCombine)?;

    let scored = catalog::candidates(None, overall_undertone)
        .into_iter()
        .map(|candidate| {
            let lab = recommend::candidate_color(&candidate)?;
            let total: f64 = weighted_reps
                .iter()
                .map(|&(rep, weight)| recommend::similarity(lab, rep) * weight)
                .sum();
            Ok(ScoredCandidate {
                candidate,
                score: recommend::round1(total),
            })
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;

    let labels: Vec<&str> = regions.iter().map(|r| r.label()).collect();
    let explanation = format!(
        "Combined analysis of {} with an overall {overall_undertone} undertone.",
        labels.join(", ")
    );

    Ok(CombinedAnalysis {
        overall_undertone,
        representative_color: color::to_hex(representative),
        regions_analyzed: regions,
        weights,
        recommended_colors: recommend::rank(scored),
        explanation,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tone::Depth;

    fn analysis(region: Region, lab: LabColor, undertone: Undertone) -> RegionOutcome {
        RegionOutcome::Analyzed(RegionAnalysis {
            region,
            depth: Depth::from_lightness(lab.l()),
            undertone,
            lab,
            hex: color::to_hex(lab),
            recommendations: Vec::new(),
            explanation: String::new(),
        })
    }

    fn weight_of(combined: &CombinedAnalysis, region: Region) -> Option<f64> {
        combined
            .weights
            .iter()
            .find(|w| w.region == region)
            .map(|w| w.weight)
    }

    #[test]
    fn weights_renormalize_over_present_regions() {
        let w = normalized_weights(&[Region::Skin, Region::Hair]);
        assert!((w[0].weight - 0.625).abs() < 1e-12);
        assert!((w[1].weight - 0.375).abs() < 1e-12);
        let all = normalized_weights(&Region::EVALUATION_ORDER);
        let total: f64 = all.iter().map(|w| w.weight).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(normalized_weights(&[]).is_empty());
    }

    #[test]
    fn majority_vote_and_tie_break() {
        use Undertone::{Cool, Neutral, Warm};
        assert_eq!(majority_undertone(&[Cool, Warm, Warm]), Some(Warm));
        assert_eq!(majority_undertone(&[Cool, Warm, Neutral]), Some(Cool));
        assert_eq!(majority_undertone(&[Warm, Cool]), Some(Warm));
        assert_eq!(majority_undertone(&[]), None);
    }

    #[test]
    fn skin_and_hair_without_hand() {
        let skin = analysis(Region::Skin, LabColor::new(180.0, 128.0, 140.0), Undertone::Warm);
        let hair = analysis(Region::Hair, LabColor::new(60.0, 130.0, 135.0), Undertone::Warm);
        let combined = combine(Some(&hair), Some(&skin), None).unwrap();
        assert_eq!(combined.regions_analyzed, vec![Region::Skin, Region::Hair]);
        assert!((weight_of(&combined, Region::Skin).unwrap() - 0.625).abs() < 1e-12);
        assert!((weight_of(&combined, Region::Hair).unwrap() - 0.375).abs() < 1e-12);
        assert!(weight_of(&combined, Region::Hand).is_none());
        assert_eq!(combined.overall_undertone, Undertone::Warm);
    }

    #[test]
    fn failed_region_is_excluded() {
        let skin = analysis(Region::Skin, LabColor::new(150.0, 135.0, 130.0), Undertone::Cool);
        let hand = RegionOutcome::from(Err(PipelineError::NoPixelsSelected));
        let combined = combine(None, Some(&skin), Some(&hand)).unwrap();
        assert_eq!(combined.regions_analyzed, vec![Region::Skin]);
        assert!((weight_of(&combined, Region::Skin).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(combined.representative_color, color::to_hex(LabColor::new(150.0, 135.0, 130.0)));
    }

    #[test]
    fn nothing_to_combine() {
        let failed = RegionOutcome::from(Err(PipelineError::EmptyInput));
        assert!(matches!(
            combine(None, None, None),
            Err(PipelineError::NothingToCombine)
        ));
        assert!(matches!(
            combine(Some(&failed), None, Some(&failed)),
            Err(PipelineError::NothingToCombine)
        ));
    }

    #[test]
    fn candidates_skip_depth_rules() {
        let skin = analysis(Region::Skin, LabColor::new(120.0, 128.0, 145.0), Undertone::Warm);
        let combined = combine(None, Some(&skin), None).unwrap();
        let names: Vec<_> = combined
            .recommended_colors
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names.len(), 14);
        assert!(names.contains(&"Mustard"));
        assert!(!names.contains(&"Teal"));
        assert!(!names.contains(&"Grey"));
    }

    #[test]
    fn single_region_scores_match_plain_similarity() {
        let lab = LabColor::new(170.0, 126.0, 150.0);
        let skin = analysis(Region::Skin, lab, Undertone::Olive);
        let combined = combine(None, Some(&skin), None).unwrap();
        for rec in &combined.recommended_colors {
            let expected = recommend::similarity(color::hex_to_perceptual(&rec.hex).unwrap(), lab);
            assert!((rec.match_percentage - expected).abs() < 1e-9, "{}", rec.name);
        }
        for pair in combined.recommended_colors.windows(2) {
            assert!(pair[0].match_percentage >= pair[1].match_percentage);
        }
    }

    #[test]
    fn dropping_hand_only_removes_its_contribution() {
        let skin = analysis(Region::Skin, LabColor::new(180.0, 128.0, 140.0), Undertone::Warm);
        let hair = analysis(Region::Hair, LabColor::new(60.0, 130.0, 135.0), Undertone::Warm);
        let hand = analysis(Region::Hand, LabColor::new(170.0, 131.0, 142.0), Undertone::Warm);
        let with_hand = combine(Some(&hair), Some(&skin), Some(&hand)).unwrap();
        let without = combine(Some(&hair), Some(&skin), None).unwrap();
        let ratio = weight_of(&with_hand, Region::Skin).unwrap()
            / weight_of(&with_hand, Region::Hair).unwrap();
        let ratio_without = weight_of(&without, Region::Skin).unwrap()
            / weight_of(&without, Region::Hair).unwrap();
        assert!((ratio - ratio_without).abs() < 1e-12);
    }
}
