//! Color clustering: partition perceptual colors into groups.
//!
//! This module defines the [`ColorClusterer`] trait for pluggable
//! clustering algorithms and the [`ClustererKind`] enum for selecting
//! which one to use from [`AnalysisConfig`](crate::AnalysisConfig).
//!
//! Any implementation must be deterministic for a given RNG state and
//! must tolerate `k` larger than the number of distinct samples (extra
//! clusters simply end up empty).

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::types::LabColor;

/// Selects which clustering algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClustererKind {
    /// Lloyd's k-means with k-means++ seeding and multiple restarts,
    /// keeping the restart with the lowest inertia.
    #[default]
    KMeans,
}

/// Tuning shared by all clustering strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterParams {
    /// Number of clusters to form.
    pub k: usize,
    /// Independent restarts; the best one is kept.
    pub restarts: usize,
    /// Iteration cap per restart.
    pub max_iterations: usize,
    /// Stop once no centroid moves further than this.
    pub tolerance: f64,
}

/// Output of one clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// Cluster centers, `k` of them.
    pub centroids: Vec<LabColor>,
    /// Members per cluster, parallel to `centroids`.
    pub counts: Vec<usize>,
    /// Sum of squared distances from each sample to its center.
    pub inertia: f64,
    /// Iterations used by the winning restart.
    pub iterations: usize,
}

impl Clustering {
    /// Index, center, and size of the most populous cluster. The lowest
    /// index wins ties. `None` if there are no clusters.
    #[must_use]
    pub fn dominant(&self) -> Option<(usize, LabColor, usize)> {
        self.counts
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, usize)>, (i, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((i, count)),
            })
            .map(|(i, count)| (i, self.centroids[i], count))
    }
}

/// Trait for clustering strategies.
///
/// Input: a non-empty sample of perceptual colors and `1 <= k <=
/// samples.len()`. Output: `k` centroids with member counts.
pub trait ColorClusterer {
    /// Cluster `samples`, drawing any randomness from `rng`.
    fn cluster(&self, samples: &[LabColor], params: &ClusterParams, rng: &mut StdRng) -> Clustering;
}

impl ColorClusterer for ClustererKind {
    fn cluster(&self, samples: &[LabColor], params: &ClusterParams, rng: &mut StdRng) -> Clustering {
        match *self {
            Self::KMeans => kmeans(samples, params, rng),
        }
    }
}

/// Run k-means `restarts` times and keep the lowest-inertia result.
fn kmeans(samples: &[LabColor], params: &ClusterParams, rng: &mut StdRng) -> Clustering {
    let empty = Clustering {
        centroids: Vec::new(),
        counts: Vec::new(),
        inertia: 0.0,
        iterations: 0,
    };
    if samples.is_empty() {
        return empty;
    }

    let k = params.k.clamp(1, samples.len());
    let mut best: Option<Clustering> = None;
    for _ in 0..params.restarts.max(1) {
        let run = kmeans_once(samples, k, params, rng);
        // Strict comparison: the earliest restart wins ties.
        if best.as_ref().is_none_or(|b| run.inertia < b.inertia) {
            best = Some(run);
        }
    }
    best.unwrap_or(empty)
}

/// One Lloyd run from a k-means++ initialization.
fn kmeans_once(
    samples: &[LabColor],
    k: usize,
    params: &ClusterParams,
    rng: &mut StdRng,
) -> Clustering {
    let mut centroids = seed_plus_plus(samples, k, rng);
    let mut assignments = vec![0_usize; samples.len()];
    let mut iterations = 0;

    while iterations < params.max_iterations {
        iterations += 1;
        assign(samples, &centroids, &mut assignments);
        let moved = relocate(samples, &assignments, &mut centroids);
        if moved <= params.tolerance {
            break;
        }
    }

    let inertia = assign(samples, &centroids, &mut assignments);
    let mut counts = vec![0_usize; k];
    for &cluster in &assignments {
        counts[cluster] += 1;
    }

    Clustering {
        centroids,
        counts,
        inertia,
        iterations,
    }
}

/// k-means++ seeding: each new center is drawn with probability
/// proportional to its squared distance from the nearest chosen center.
fn seed_plus_plus(samples: &[LabColor], k: usize, rng: &mut StdRng) -> Vec<LabColor> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(samples[rng.gen_range(0..samples.len())]);

    let mut nearest: Vec<f64> = samples
        .iter()
        .map(|s| s.distance_squared(centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = nearest.iter().sum();
        let next = if total > 0.0 {
            let target = rng.r#gen::<f64>() * total;
            let mut running = 0.0;
            nearest
                .iter()
                .position(|&d| {
                    running += d;
                    running > target
                })
                .unwrap_or(samples.len() - 1)
        } else {
            // Every sample coincides with a chosen center.
            rng.gen_range(0..samples.len())
        };

        let center = samples[next];
        centroids.push(center);
        for (d, s) in nearest.iter_mut().zip(samples) {
            *d = d.min(s.distance_squared(center));
        }
    }

    centroids
}

/// Assign each sample to its nearest center (lowest index on ties) and
/// return the total squared distance.
fn assign(samples: &[LabColor], centroids: &[LabColor], assignments: &mut [usize]) -> f64 {
    let mut inertia = 0.0;
    for (sample, slot) in samples.iter().zip(assignments.iter_mut()) {
        let (index, distance) = centroids
            .iter()
            .map(|c| sample.distance_squared(*c))
            .enumerate()
            .fold((0, f64::INFINITY), |best, (i, d)| {
                if d < best.1 { (i, d) } else { best }
            });
        *slot = index;
        inertia += distance;
    }
    inertia
}

/// Move each center to the mean of its members. Empty clusters keep
/// their previous center. Returns the largest distance any center moved.
#[allow(clippy::cast_precision_loss)]
fn relocate(samples: &[LabColor], assignments: &[usize], centroids: &mut [LabColor]) -> f64 {
    let mut sums = vec![[0.0_f64; 3]; centroids.len()];
    let mut counts = vec![0_usize; centroids.len()];
    for (sample, &cluster) in samples.iter().zip(assignments) {
        let [l, a, b] = sample.to_array();
        let sum = &mut sums[cluster];
        sum[0] += l;
        sum[1] += a;
        sum[2] += b;
        counts[cluster] += 1;
    }

    let mut moved: f64 = 0.0;
    for ((centroid, sum), &count) in centroids.iter_mut().zip(&sums).zip(&counts) {
        if count == 0 {
            continue;
        }
        let n = count as f64;
        let updated = LabColor::new(sum[0] / n, sum[1] / n, sum[2] / n);
        moved = moved.max(centroid.distance(updated));
        *centroid = updated;
    }
    moved
}
