//! Region diagnostics: timing, counts, and other metrics for each stage.
//!
//! These diagnostics are permanent instrumentation for tuning the
//! clustering parameters. Every run of the incremental
//! [`RegionPipeline`](crate::pipeline::RegionPipeline) collects them
//! alongside the analysis.
//!
//! Duration measurements use [`std::time::Duration`]. Timestamps are
//! captured with the `web-time` crate, which uses `performance.now()` on
//! WASM and `std::time::Instant` on native.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::tone::{Depth, Undertone};
use crate::types::Region;

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from one region's pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionDiagnostics {
    /// Which region was analyzed.
    pub region: Region,
    /// Stages in the order they ran.
    pub stages: Vec<StageDiagnostics>,
    /// Wall-clock duration from pipeline creation to scoring (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: RegionSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image and mask decoding.
    Decode {
        /// Size of the encoded image, or 0 when the pipeline started
        /// from an already-decoded image.
        image_bytes: usize,
        /// Size of the encoded mask.
        mask_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
    },
    /// Mask fitting and pixel selection.
    Extract {
        /// Mask width before fitting.
        mask_width: u32,
        /// Mask height before fitting.
        mask_height: u32,
        /// Whether the mask had to be resized to the image.
        resized: bool,
        /// Pixels under the mask.
        selected_pixels: usize,
        /// Pixels in the image.
        total_pixels: u64,
    },
    /// Working-set sampling and perceptual conversion.
    Sample {
        /// Selected pixels before sampling.
        input_count: usize,
        /// Pixels kept for clustering.
        sample_count: usize,
    },
    /// Dominant-color clustering.
    Cluster {
        /// Which strategy ran.
        strategy: String,
        /// Clusters formed.
        clusters: usize,
        /// Iterations used by the winning restart.
        iterations: usize,
        /// Members of the dominant cluster.
        dominant_population: usize,
        /// Total squared distance of the winning run.
        inertia: f64,
    },
    /// Depth and undertone classification.
    Classify {
        /// Lightness band.
        depth: Depth,
        /// Chromatic bias.
        undertone: Undertone,
    },
    /// Palette scoring.
    Score {
        /// Candidates scored.
        candidates: usize,
        /// Best similarity, if any candidate was scored.
        best_match: Option<f64>,
    },
}

/// High-level summary counts for one region.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Pixels under the mask.
    pub selected_pixels: usize,
    /// Pixels actually clustered.
    pub sampled_pixels: usize,
    /// Clusters formed.
    pub clusters: usize,
    /// Members of the dominant cluster.
    pub dominant_population: usize,
}

impl RegionDiagnostics {
    /// Duration of the first stage with matching metrics, if it ran.
    #[must_use]
    pub fn stage_duration(&self, name: &str) -> Option<Duration> {
        self.stages
            .iter()
            .find(|s| s.metrics.name() == name)
            .map(|s| s.duration)
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "Region Diagnostics Report: {}\n{}",
            self.region,
            "=".repeat(60)
        ));
        #[allow(clippy::cast_precision_loss)]
        let coverage = {
            let total = u64::from(self.summary.image_width) * u64::from(self.summary.image_height);
            if total > 0 {
                self.summary.selected_pixels as f64 / total as f64 * 100.0
            } else {
                0.0
            }
        };
        lines.push(format!(
            "Image: {}x{}  |  Selected: {} pixels ({coverage:.1}%)",
            self.summary.image_width, self.summary.image_height, self.summary.selected_pixels,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<12} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for stage in &self.stages {
            let ms = duration_ms(stage.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let name = stage.metrics.name();
            let details = format_metrics(&stage.metrics);
            lines.push(format!("{name:<12} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Sampled: {}  |  Clusters: {}  |  Dominant population: {}",
            self.summary.sampled_pixels, self.summary.clusters, self.summary.dominant_population,
        ));

        lines.join("\n")
    }
}

impl StageMetrics {
    /// Display name of the stage these metrics belong to.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "Decode",
            Self::Extract { .. } => "Extract",
            Self::Sample { .. } => "Sample",
            Self::Cluster { .. } => "Cluster",
            Self::Classify { .. } => "Classify",
            Self::Score { .. } => "Score",
        }
    }
}

/// Accumulates stage timings while a pipeline advances.
#[derive(Debug, Clone)]
pub(crate) struct Recorder {
    region: Region,
    started: Instant,
    stage_started: Instant,
    stages: Vec<StageDiagnostics>,
    pub summary: RegionSummary,
}

impl Recorder {
    pub fn start(region: Region) -> Self {
        let now = Instant::now();
        Self {
            region,
            started: now,
            stage_started: now,
            stages: Vec::new(),
            summary: RegionSummary::default(),
        }
    }

    /// Close the current stage and open the next one.
    pub fn record(&mut self, metrics: StageMetrics) {
        let now = Instant::now();
        log::debug!(
            "{}: {} finished: {}",
            self.region,
            metrics.name(),
            format_metrics(&metrics)
        );
        self.stages.push(StageDiagnostics {
            duration: now.duration_since(self.stage_started),
            metrics,
        });
        self.stage_started = now;
    }

    pub fn stages(&self) -> &[StageDiagnostics] {
        &self.stages
    }

    pub fn finish(self) -> RegionDiagnostics {
        RegionDiagnostics {
            region: self.region,
            stages: self.stages,
            total_duration: self.started.elapsed(),
            summary: self.summary,
        }
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            image_bytes,
            mask_bytes,
            width,
            height,
        } => format!("{image_bytes}+{mask_bytes} bytes -> {width}x{height}"),
        StageMetrics::Extract {
            mask_width,
            mask_height,
            resized,
            selected_pixels,
            total_pixels,
        } => {
            let fit = if *resized { " (resized)" } else { "" };
            format!("mask {mask_width}x{mask_height}{fit}, {selected_pixels}/{total_pixels} px")
        }
        StageMetrics::Sample {
            input_count,
            sample_count,
        } => format!("{input_count} -> {sample_count} px"),
        StageMetrics::Cluster {
            strategy,
            clusters,
            iterations,
            dominant_population,
            inertia,
        } => format!(
            "{strategy} k={clusters} iters={iterations} dominant={dominant_population} inertia={inertia:.1}",
        ),
        StageMetrics::Classify { depth, undertone } => format!("{depth}, {undertone}"),
        StageMetrics::Score {
            candidates,
            best_match,
        } => match best_match {
            Some(best) => format!("{candidates} candidates, best {best:.1}%"),
            None => format!("{candidates} candidates"),
        },
    }
}
