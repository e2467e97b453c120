//! Dominant color estimation: reduce a region's pixels to one
//! representative perceptual color.
//!
//! Large regions are first sampled down to a bounded working set, then
//! clustered; the center of the most populous cluster is the
//! representative color. Every random choice is drawn from an RNG seeded
//! with [`AnalysisConfig::seed`], so the same pixels and seed always give
//! the same answer.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::cluster::{ClusterParams, ColorClusterer, Clustering};
use crate::types::{AnalysisConfig, LabColor, PipelineError};

/// The representative color of a region plus how it was chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct DominantColor {
    /// Center of the most populous cluster.
    pub color: LabColor,
    /// Members of that cluster.
    pub population: usize,
    /// Number of clusters actually formed.
    pub clusters: usize,
    /// Size of the clustered working set.
    pub sample_count: usize,
    /// Total squared distance of the winning clustering.
    pub inertia: f64,
}

impl DominantColor {
    /// Summarize a finished clustering of `sample_count` samples.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoPixelsSelected`] if the clustering has
    /// no clusters (empty input).
    pub fn from_clustering(
        clustering: &Clustering,
        sample_count: usize,
    ) -> Result<Self, PipelineError> {
        let (_, color, population) = clustering
            .dominant()
            .ok_or(PipelineError::NoPixelsSelected)?;
        Ok(Self {
            color,
            population,
            clusters: clustering.centroids.len(),
            sample_count,
            inertia: clustering.inertia,
        })
    }
}

/// Cluster count to use for `sample_count` samples.
///
/// The requested `k` is kept when there are at least `k` samples;
/// otherwise it drops to `max(1, sample_count / 2)`.
#[must_use]
pub const fn effective_k(requested: usize, sample_count: usize) -> usize {
    if sample_count < requested {
        let half = sample_count / 2;
        if half > 1 { half } else { 1 }
    } else {
        requested
    }
}

/// Cap `items` at `max_samples` by drawing uniformly without
/// replacement. Chosen samples keep their original relative order.
///
/// Inputs at or under the cap are returned unchanged. Works on raw
/// pixels as well as perceptual colors, so sampling can happen before
/// conversion.
#[must_use]
pub fn sample<T: Copy>(items: Vec<T>, max_samples: usize, seed: u64) -> Vec<T> {
    if items.len() <= max_samples {
        return items;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = rand::seq::index::sample(&mut rng, items.len(), max_samples).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| items[i]).collect()
}

/// Cluster an already-sampled working set with the configured strategy.
#[must_use]
pub fn cluster(samples: &[LabColor], config: &AnalysisConfig) -> Clustering {
    let params = ClusterParams {
        k: effective_k(config.clusters, samples.len()),
        restarts: config.restarts,
        max_iterations: config.max_iterations,
        tolerance: config.tolerance,
    };
    let mut rng = StdRng::seed_from_u64(config.seed);
    config.clusterer.cluster(samples, &params, &mut rng)
}

/// Pick the representative color of an already-sampled working set.
///
/// # Errors
///
/// Returns [`PipelineError::NoPixelsSelected`] if `samples` is empty.
pub fn representative(
    samples: &[LabColor],
    config: &AnalysisConfig,
) -> Result<DominantColor, PipelineError> {
    DominantColor::from_clustering(&cluster(samples, config), samples.len())
}

/// Sample and cluster a region's colors in one step.
///
/// # Errors
///
/// Returns [`PipelineError::NoPixelsSelected`] if `colors` is empty.
pub fn dominant_color(
    colors: Vec<LabColor>,
    config: &AnalysisConfig,
) -> Result<DominantColor, PipelineError> {
    if colors.is_empty() {
        return Err(PipelineError::NoPixelsSelected);
    }
    let samples = sample(colors, config.max_samples, config.seed);
    representative(&samples, config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn gray(l: f64) -> LabColor {
        LabColor::new(l, 128.0, 128.0)
    }

    #[test]
    fn effective_k_keeps_request_when_enough_samples() {
        assert_eq!(effective_k(5, 5), 5);
        assert_eq!(effective_k(5, 5000), 5);
    }

    #[test]
    fn effective_k_halves_small_inputs() {
        assert_eq!(effective_k(5, 4), 2);
        assert_eq!(effective_k(5, 3), 1);
        assert_eq!(effective_k(5, 2), 1);
        assert_eq!(effective_k(5, 1), 1);
        assert_eq!(effective_k(5, 0), 1);
    }

    #[test]
    fn sample_leaves_small_inputs_alone() {
        let colors: Vec<LabColor> = (0..10).map(|i| gray(f64::from(i))).collect();
        assert_eq!(sample(colors.clone(), 10, 42), colors);
    }

    #[test]
    fn sample_caps_without_replacement_in_order() {
        let colors: Vec<LabColor> = (0..1000).map(|i| gray(f64::from(i) / 10.0)).collect();
        let picked = sample(colors, 100, 42);
        assert_eq!(picked.len(), 100);
        // Strictly increasing lightness means no duplicates and order kept.
        for pair in picked.windows(2) {
            assert!(pair[0].l() < pair[1].l());
        }
    }

    #[test]
    fn sample_is_seeded() {
        let colors: Vec<LabColor> = (0..500).map(|i| gray(f64::from(i) / 2.0)).collect();
        assert_eq!(
            sample(colors.clone(), 50, 7),
            sample(colors.clone(), 50, 7)
        );
        assert_ne!(sample(colors.clone(), 50, 7), sample(colors, 50, 8));
    }

    #[test]
    fn majority_color_wins() {
        let mut colors = vec![gray(60.0); 30];
        colors.extend(vec![LabColor::new(190.0, 130.0, 145.0); 70]);
        let dominant = dominant_color(colors, &AnalysisConfig::default()).unwrap();
        assert_eq!(dominant.population, 70);
        assert!((dominant.color.l() - 190.0).abs() < 1e-9);
        assert!((dominant.color.b() - 145.0).abs() < 1e-9);
        assert_eq!(dominant.sample_count, 100);
    }

    #[test]
    fn single_pixel_region() {
        let dominant = dominant_color(vec![gray(123.0)], &AnalysisConfig::default()).unwrap();
        assert_eq!(dominant.clusters, 1);
        assert_eq!(dominant.population, 1);
        assert_eq!(dominant.color, gray(123.0));
    }

    #[test]
    fn empty_region_is_an_error() {
        assert!(matches!(
            dominant_color(Vec::new(), &AnalysisConfig::default()),
            Err(PipelineError::NoPixelsSelected)
        ));
    }

    #[test]
    fn deterministic_for_fixed_seed() {
        let colors: Vec<LabColor> = (0..8000)
            .map(|i| {
                let x = f64::from(i % 97);
                LabColor::new(100.0 + x, 120.0 + x / 10.0, 130.0 + x / 7.0)
            })
            .collect();
        let config = AnalysisConfig {
            seed: 1234,
            ..AnalysisConfig::default()
        };
        let first = dominant_color(colors.clone(), &config).unwrap();
        let second = dominant_color(colors, &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.sample_count, config.max_samples);
    }
}
