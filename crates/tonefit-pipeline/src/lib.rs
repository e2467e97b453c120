//! tonefit-pipeline: Pure color analysis pipeline (sans-IO).
//!
//! Estimates skin, hair, and hand color from a photograph plus binary
//! region masks, then recommends clothing colors:
//! mask -> perceptual color conversion -> dominant-color clustering ->
//! depth/undertone classification -> palette scoring -> weighted
//! combination across regions.
//!
//! This crate has **no I/O dependencies**. It operates on in-memory
//! byte slices and returns structured, serde-serializable data. Moving
//! bytes over HTTP is the embedding service's job.

pub mod catalog;
pub mod cluster;
pub mod color;
pub mod combine;
pub mod decode;
pub mod diagnostics;
pub mod dominant;
pub mod mask;
pub mod pipeline;
pub mod recommend;
pub mod tone;
pub mod types;

use rayon::prelude::*;

pub use cluster::{ClustererKind, ColorClusterer};
pub use combine::combine;
pub use diagnostics::RegionDiagnostics;
pub use pipeline::RegionPipeline;
pub use tone::{Depth, Tone, Undertone};
pub use types::{
    AnalysisConfig, AnalysisRequest, AnalysisResponse, CombinedAnalysis, CombinedOutcome,
    LabColor, PipelineError, RecommendedColor, Region, RegionAnalysis, RegionOutcome,
    RegionWeight,
};

/// Value of [`AnalysisResponse::status`] for every completed request.
pub const STATUS_SUCCESS: &str = "success";

/// Analyze one region of a photograph.
///
/// Takes the encoded photograph and the encoded mask for `region` (PNG,
/// JPEG, BMP, WebP) and returns the region's representative color,
/// classification, and ranked recommendations.
///
/// # Pipeline steps
///
/// 1. Decode the image and mask
/// 2. Resize the mask to the image and select the masked pixels
/// 3. Sample at most `config.max_samples` pixels and convert to CIELAB
/// 4. Cluster and take the center of the largest cluster
/// 5. Classify depth and undertone
/// 6. Score and rank the catalog candidates
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] or [`PipelineError::ImageDecode`]
/// if either input is not a usable image.
/// Returns [`PipelineError::NoPixelsSelected`] if the mask selects nothing.
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
pub fn analyze_region(
    image_bytes: &[u8],
    mask_bytes: &[u8],
    region: Region,
    config: &AnalysisConfig,
) -> Result<RegionAnalysis, PipelineError> {
    config.validate()?;
    let (analysis, _) = RegionPipeline::new(region, image_bytes, mask_bytes, config.clone())
        .decode()?
        .extract()?
        .sample()
        .cluster()?
        .classify()
        .score()?
        .into_result();
    Ok(analysis)
}

/// Run one region against an already-decoded photograph.
fn run_region(
    region: Region,
    image: &image::RgbImage,
    mask_bytes: &[u8],
    config: &AnalysisConfig,
) -> Result<(RegionAnalysis, RegionDiagnostics), PipelineError> {
    Ok(RegionPipeline::from_image(region, image, mask_bytes, config.clone())?
        .extract()?
        .sample()
        .cluster()?
        .classify()
        .score()?
        .into_result())
}

/// Analyze every region with a mask and combine the results.
///
/// The photograph is decoded once and shared. Regions run in parallel
/// on the rayon thread pool; a failing region becomes a
/// [`RegionOutcome::Failed`] and never affects the others. If the
/// photograph itself cannot be decoded, every requested region fails
/// with that decode error.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails
/// validation. Every other failure is reported inside the response.
pub fn analyze(
    request: &AnalysisRequest<'_>,
    config: &AnalysisConfig,
) -> Result<AnalysisResponse, PipelineError> {
    config.validate()?;

    let image = decode::decode_image(request.image);
    if let Err(e) = &image {
        log::warn!("photograph could not be decoded: {e}");
    }

    let requested: Vec<(Region, &[u8])> = Region::EVALUATION_ORDER
        .into_iter()
        .filter_map(|region| Some((region, request.mask(region)?)))
        .collect();

    let outcomes: Vec<(Region, RegionOutcome)> = requested
        .par_iter()
        .map(|&(region, mask)| {
            let outcome = match &image {
                Ok(image) => match run_region(region, image, mask, config) {
                    Ok((analysis, diagnostics)) => {
                        log::debug!("{}", diagnostics.report());
                        RegionOutcome::Analyzed(analysis)
                    }
                    Err(e) => {
                        log::warn!("{region} analysis failed: {e}");
                        RegionOutcome::from(Err(e))
                    }
                },
                Err(e) => RegionOutcome::Failed {
                    error: e.to_string(),
                },
            };
            (region, outcome)
        })
        .collect();

    let mut response = AnalysisResponse {
        status: STATUS_SUCCESS.to_owned(),
        hair: None,
        skin: None,
        hand: None,
        combined_analysis: CombinedOutcome::Failed {
            error: PipelineError::NothingToCombine.to_string(),
        },
    };
    for (region, outcome) in outcomes {
        match region {
            Region::Hair => response.hair = Some(outcome),
            Region::Skin => response.skin = Some(outcome),
            Region::Hand => response.hand = Some(outcome),
        }
    }

    let combined = combine::combine(
        response.hair.as_ref(),
        response.skin.as_ref(),
        response.hand.as_ref(),
    );
    if let Err(e) = &combined {
        log::warn!("combined analysis unavailable: {e}");
    }
    response.combined_analysis = combined.into();
    Ok(response)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Create a PNG where the top half is one color and the bottom half
    /// another.
    fn two_tone_png(top: [u8; 3], bottom: [u8; 3]) -> Vec<u8> {
        let img = image::RgbImage::from_fn(16, 16, |_, y| {
            if y < 8 {
                image::Rgb(top)
            } else {
                image::Rgb(bottom)
            }
        });
        encode(&img)
    }

    /// Mask covering rows `[from, to)` of a 16x16 image.
    fn rows_mask(from: u32, to: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(16, 16, |_, y| {
            if (from..to).contains(&y) {
                image::Rgb([255, 255, 255])
            } else {
                image::Rgb([0, 0, 0])
            }
        });
        encode(&img)
    }

    fn encode(img: &image::RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn analyze_region_empty_input() {
        let mask = rows_mask(0, 16);
        let result = analyze_region(&[], &mask, Region::Skin, &AnalysisConfig::default());
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn analyze_region_corrupt_input() {
        let mask = rows_mask(0, 16);
        let result = analyze_region(&[0xFF, 0x00], &mask, Region::Skin, &AnalysisConfig::default());
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn analyze_region_reports_selected_color() {
        let photo = two_tone_png([224, 172, 138], [30, 30, 30]);
        let analysis = analyze_region(
            &photo,
            &rows_mask(0, 8),
            Region::Skin,
            &AnalysisConfig::default(),
        )
        .unwrap();
        assert_eq!(analysis.hex, "#E0AC8A");
        assert_eq!(analysis.undertone, Undertone::Warm);
        assert_eq!(
            analysis.explanation,
            format!("Based on {} skin depth and Warm undertone.", analysis.depth)
        );
    }

    #[test]
    fn analyze_region_rejects_bad_config() {
        let photo = two_tone_png([224, 172, 138], [30, 30, 30]);
        let config = AnalysisConfig {
            max_samples: 0,
            ..AnalysisConfig::default()
        };
        let result = analyze_region(&photo, &rows_mask(0, 8), Region::Skin, &config);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn analyze_fills_present_regions_only() {
        let photo = two_tone_png([224, 172, 138], [45, 35, 30]);
        let skin = rows_mask(0, 8);
        let hair = rows_mask(8, 16);
        let request = AnalysisRequest {
            image: &photo,
            skin_mask: Some(&skin),
            hair_mask: Some(&hair),
            hand_mask: None,
        };
        let response = analyze(&request, &AnalysisConfig::default()).unwrap();
        assert_eq!(response.status, STATUS_SUCCESS);
        assert!(response.hand.is_none());
        assert!(response.skin.as_ref().unwrap().analysis().is_some());
        assert!(response.hair.as_ref().unwrap().analysis().is_some());
        let combined = response.combined_analysis.analysis().unwrap();
        assert_eq!(combined.regions_analyzed, vec![Region::Skin, Region::Hair]);
    }

    #[test]
    fn undecodable_photo_fails_every_region() {
        let skin = rows_mask(0, 8);
        let hand = rows_mask(8, 16);
        let request = AnalysisRequest {
            image: b"not an image",
            skin_mask: Some(&skin),
            hand_mask: Some(&hand),
            ..AnalysisRequest::default()
        };
        let response = analyze(&request, &AnalysisConfig::default()).unwrap();
        for region in [Region::Skin, Region::Hand] {
            let error = response.outcome(region).unwrap().error().unwrap();
            assert!(error.starts_with("Invalid image file"), "{error}");
        }
        assert!(response.hair.is_none());
        assert!(response.combined_analysis.analysis().is_none());
    }

    #[test]
    fn analyze_without_masks_has_nothing_to_combine() {
        let photo = two_tone_png([224, 172, 138], [45, 35, 30]);
        let request = AnalysisRequest {
            image: &photo,
            ..AnalysisRequest::default()
        };
        let response = analyze(&request, &AnalysisConfig::default()).unwrap();
        assert_eq!(
            response.combined_analysis,
            CombinedOutcome::Failed {
                error: "No valid regions to combine".to_owned()
            }
        );
    }

    #[test]
    fn analyze_rejects_bad_config() {
        let request = AnalysisRequest::default();
        let config = AnalysisConfig {
            restarts: 0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            analyze(&request, &config),
            Err(PipelineError::InvalidConfig(_))
        ));
    }
}
