//! Incremental region pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::analyze_region`] which runs the whole region analysis
//! in one call, [`RegionPipeline`] lets the caller drive execution one
//! step at a time:
//!
//! ```rust
//! # use tonefit_pipeline::{AnalysisConfig, PipelineError, Region, RegionPipeline};
//! # fn run(photo: &[u8], mask: &[u8]) -> Result<(), PipelineError> {
//! let scored = RegionPipeline::new(Region::Skin, photo, mask, AnalysisConfig::default())
//!     .decode()?
//!     .extract()?
//!     .sample()
//!     .cluster()?
//!     .classify()
//!     .score()?;
//!
//! let (analysis, diagnostics) = scored.into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages). Only the decoded image is borrowed
//! (when the caller already holds one); from [`Extracted`] onward the
//! state owns just the selected pixels and what was derived from them.

use std::borrow::Cow;

use image::{GrayImage, Rgb, RgbImage};

use crate::cluster::Clustering;
use crate::diagnostics::{Recorder, RegionDiagnostics, StageDiagnostics, StageMetrics};
use crate::dominant::{self, DominantColor};
use crate::tone::Tone;
use crate::types::{AnalysisConfig, LabColor, PipelineError, RecommendedColor, Region, RegionAnalysis};

/// Entry point for the incremental pipeline.
pub struct RegionPipeline;

impl RegionPipeline {
    /// Start a pipeline from encoded image and mask bytes.
    pub const fn new<'a>(
        region: Region,
        image: &'a [u8],
        mask: &'a [u8],
        config: AnalysisConfig,
    ) -> Pending<'a> {
        Pending {
            region,
            config,
            image,
            mask,
        }
    }

    /// Start a pipeline from an image the caller has already decoded.
    ///
    /// Only the mask is decoded here, so one photograph can be shared by
    /// several regions.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyInput`] or
    /// [`PipelineError::ImageDecode`] if the mask cannot be decoded.
    pub fn from_image<'a>(
        region: Region,
        image: &'a RgbImage,
        mask: &[u8],
        config: AnalysisConfig,
    ) -> Result<Decoded<'a>, PipelineError> {
        let mut recorder = Recorder::start(region);
        let mask_image = crate::decode::decode_mask(mask)?;
        recorder.record(StageMetrics::Decode {
            image_bytes: 0,
            mask_bytes: mask.len(),
            width: image.width(),
            height: image.height(),
        });
        Ok(Decoded::new(region, config, Cow::Borrowed(image), mask_image, recorder))
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// Call [`decode`](Self::decode) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing, call .decode() to continue"]
pub struct Pending<'a> {
    region: Region,
    config: AnalysisConfig,
    image: &'a [u8],
    mask: &'a [u8],
}

impl<'a> Pending<'a> {
    /// The region this pipeline analyzes.
    #[must_use]
    pub const fn region(&self) -> Region {
        self.region
    }

    /// Decode the image and mask and advance to the [`Decoded`] stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyInput`] if either input is empty.
    /// Returns [`PipelineError::ImageDecode`] if either input is not a
    /// recognizable image.
    pub fn decode(self) -> Result<Decoded<'a>, PipelineError> {
        let mut recorder = Recorder::start(self.region);
        let image = crate::decode::decode_image(self.image)?;
        let mask = crate::decode::decode_mask(self.mask)?;
        recorder.record(StageMetrics::Decode {
            image_bytes: self.image.len(),
            mask_bytes: self.mask.len(),
            width: image.width(),
            height: image.height(),
        });
        Ok(Decoded::new(self.region, self.config, Cow::Owned(image), mask, recorder))
    }
}

// ───────────────────────── Stage 1: Decoded ──────────────────────────

/// Pipeline state after decoding.
///
/// Call [`extract`](Self::extract) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing, call .extract() to continue"]
pub struct Decoded<'a> {
    region: Region,
    config: AnalysisConfig,
    image: Cow<'a, RgbImage>,
    mask: GrayImage,
    recorder: Recorder,
}

impl<'a> Decoded<'a> {
    fn new(
        region: Region,
        config: AnalysisConfig,
        image: Cow<'a, RgbImage>,
        mask: GrayImage,
        mut recorder: Recorder,
    ) -> Self {
        recorder.summary.image_width = image.width();
        recorder.summary.image_height = image.height();
        Self {
            region,
            config,
            image,
            mask,
            recorder,
        }
    }

    /// The decoded photograph.
    #[must_use]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// The decoded mask, at its original resolution.
    #[must_use]
    pub const fn mask(&self) -> &GrayImage {
        &self.mask
    }

    /// Select the pixels under the mask and advance to [`Extracted`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoPixelsSelected`] if the mask selects
    /// nothing.
    pub fn extract(mut self) -> Result<Extracted, PipelineError> {
        let pixels = crate::mask::extract_region(&self.image, &self.mask)?;
        let (width, height) = self.image.dimensions();
        self.recorder.record(StageMetrics::Extract {
            mask_width: self.mask.width(),
            mask_height: self.mask.height(),
            resized: self.mask.dimensions() != (width, height),
            selected_pixels: pixels.len(),
            total_pixels: u64::from(width) * u64::from(height),
        });
        self.recorder.summary.selected_pixels = pixels.len();
        Ok(Extracted {
            region: self.region,
            config: self.config,
            pixels,
            recorder: self.recorder,
        })
    }
}

// ───────────────────────── Stage 2: Extracted ────────────────────────

/// Pipeline state after pixel selection.
///
/// Call [`sample`](Self::sample) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing, call .sample() to continue"]
pub struct Extracted {
    region: Region,
    config: AnalysisConfig,
    pixels: Vec<Rgb<u8>>,
    recorder: Recorder,
}

impl Extracted {
    /// Selected pixels in row-major order. Never empty.
    #[must_use]
    pub fn pixels(&self) -> &[Rgb<u8>] {
        &self.pixels
    }

    /// Cap the selection at `config.max_samples`, convert it to
    /// perceptual colors, and advance to [`Sampled`].
    pub fn sample(mut self) -> Sampled {
        let selected = self.pixels.len();
        let picked = dominant::sample(self.pixels, self.config.max_samples, self.config.seed);
        let samples = crate::color::pixels_to_perceptual(&picked);
        self.recorder.record(StageMetrics::Sample {
            input_count: selected,
            sample_count: samples.len(),
        });
        self.recorder.summary.sampled_pixels = samples.len();
        Sampled {
            region: self.region,
            config: self.config,
            selected,
            samples,
            recorder: self.recorder,
        }
    }
}

// ───────────────────────── Stage 3: Sampled ──────────────────────────

/// Pipeline state after sampling and color conversion.
///
/// Call [`cluster`](Self::cluster) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing, call .cluster() to continue"]
pub struct Sampled {
    region: Region,
    config: AnalysisConfig,
    selected: usize,
    samples: Vec<LabColor>,
    recorder: Recorder,
}

impl Sampled {
    /// The clustering working set.
    #[must_use]
    pub fn samples(&self) -> &[LabColor] {
        &self.samples
    }

    /// How many pixels were selected before sampling.
    #[must_use]
    pub const fn selected_count(&self) -> usize {
        self.selected
    }

    /// Cluster the working set and advance to [`Clustered`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoPixelsSelected`] if the working set is
    /// empty.
    pub fn cluster(mut self) -> Result<Clustered, PipelineError> {
        let clustering = dominant::cluster(&self.samples, &self.config);
        let dominant = DominantColor::from_clustering(&clustering, self.samples.len())?;
        self.recorder.record(StageMetrics::Cluster {
            strategy: format!("{:?}", self.config.clusterer),
            clusters: dominant.clusters,
            iterations: clustering.iterations,
            dominant_population: dominant.population,
            inertia: dominant.inertia,
        });
        self.recorder.summary.clusters = dominant.clusters;
        self.recorder.summary.dominant_population = dominant.population;
        Ok(Clustered {
            region: self.region,
            clustering,
            dominant,
            recorder: self.recorder,
        })
    }
}

// ───────────────────────── Stage 4: Clustered ────────────────────────

/// Pipeline state after clustering.
///
/// Call [`classify`](Self::classify) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing, call .classify() to continue"]
pub struct Clustered {
    region: Region,
    clustering: Clustering,
    dominant: DominantColor,
    recorder: Recorder,
}

impl Clustered {
    /// Every cluster with its member count.
    #[must_use]
    pub const fn clustering(&self) -> &Clustering {
        &self.clustering
    }

    /// The most populous cluster.
    #[must_use]
    pub const fn dominant(&self) -> &DominantColor {
        &self.dominant
    }

    /// Classify the representative color and advance to [`Classified`].
    pub fn classify(mut self) -> Classified {
        let tone = Tone::classify(self.dominant.color);
        self.recorder.record(StageMetrics::Classify {
            depth: tone.depth,
            undertone: tone.undertone,
        });
        Classified {
            region: self.region,
            representative: self.dominant.color,
            tone,
            recorder: self.recorder,
        }
    }
}

// ───────────────────────── Stage 5: Classified ───────────────────────

/// Pipeline state after depth and undertone classification.
///
/// Call [`score`](Self::score) to advance to the final stage.
#[must_use = "pipeline stages are consumed by advancing, call .score() to continue"]
pub struct Classified {
    region: Region,
    representative: LabColor,
    tone: Tone,
    recorder: Recorder,
}

impl Classified {
    /// The representative color.
    #[must_use]
    pub const fn representative(&self) -> LabColor {
        self.representative
    }

    /// Depth and undertone.
    #[must_use]
    pub const fn tone(&self) -> Tone {
        self.tone
    }

    /// Rank the catalog against the representative color and advance to
    /// [`Scored`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidHex`] if a catalog code fails to
    /// parse.
    pub fn score(mut self) -> Result<Scored, PipelineError> {
        let recommendations = crate::recommend::recommend(
            self.representative,
            self.tone.depth,
            self.tone.undertone,
        )?;
        self.recorder.record(StageMetrics::Score {
            candidates: recommendations.len(),
            best_match: recommendations.first().map(|c| c.match_percentage),
        });
        Ok(Scored {
            region: self.region,
            representative: self.representative,
            tone: self.tone,
            recommendations,
            recorder: self.recorder,
        })
    }
}

// ───────────────────────── Stage 6: Scored ───────────────────────────

/// Pipeline state after palette scoring, the final stage.
///
/// Call [`into_result`](Self::into_result) to extract the analysis and
/// its diagnostics.
#[must_use = "call .into_result() to extract the RegionAnalysis"]
pub struct Scored {
    region: Region,
    representative: LabColor,
    tone: Tone,
    recommendations: Vec<RecommendedColor>,
    recorder: Recorder,
}

impl Scored {
    /// Ranked recommendations, best first.
    #[must_use]
    pub fn recommendations(&self) -> &[RecommendedColor] {
        &self.recommendations
    }

    /// Stage timings so far.
    #[must_use]
    pub fn stages(&self) -> &[StageDiagnostics] {
        self.recorder.stages()
    }

    /// Consume the pipeline and return the analysis with diagnostics.
    #[must_use]
    pub fn into_result(self) -> (RegionAnalysis, RegionDiagnostics) {
        let analysis = RegionAnalysis {
            region: self.region,
            depth: self.tone.depth,
            undertone: self.tone.undertone,
            lab: self.representative,
            hex: crate::color::to_hex(self.representative),
            recommendations: self.recommendations,
            explanation: self.tone.explanation(),
        };
        (analysis, self.recorder.finish())
    }
}
