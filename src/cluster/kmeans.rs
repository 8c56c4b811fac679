//! Deterministic Lloyd's k-means.
//!
//! Seeding is index-based rather than random: center `i` of `k` starts at row
//! `floor(i·n/k)`, so identical input always yields identical labels.

use crate::error::ClusterError;

use super::ClusterResult;
use super::metrics::{common_dimension, euclidean_distance_squared};

/// Labels and final centers of one k-means run.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Cluster label in `0..k` per input row.
    pub labels: Vec<usize>,
    pub centers: Vec<Vec<f64>>,
}

/// Index of the nearest center; ties go to the lowest index.
fn nearest(point: &[f64], centers: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (c, center) in centers.iter().enumerate() {
        let d = euclidean_distance_squared(point, center);
        if d < best_dist {
            best = c;
            best_dist = d;
        }
    }
    best
}

/// Run exactly `iterations` assign/update rounds. No convergence check.
///
/// A cluster left empty by an assignment step keeps its previous center.
pub fn kmeans(points: &[Vec<f64>], k: usize, iterations: usize) -> ClusterResult<KMeansResult> {
    let n = points.len();
    if k == 0 || k > n {
        return Err(ClusterError::InvalidK { k, n });
    }
    let dim = common_dimension(points)?;

    let mut centers: Vec<Vec<f64>> = (0..k).map(|i| points[i * n / k].clone()).collect();
    let mut labels = vec![0usize; n];

    for _ in 0..iterations {
        for (label, point) in labels.iter_mut().zip(points) {
            *label = nearest(point, &centers);
        }

        let mut sums = vec![vec![0.0; dim]; k];
        let mut counts = vec![0usize; k];
        for (&label, point) in labels.iter().zip(points) {
            counts[label] += 1;
            for (s, v) in sums[label].iter_mut().zip(point) {
                *s += v;
            }
        }
        for ((center, sum), count) in centers.iter_mut().zip(sums).zip(counts) {
            if count > 0 {
                *center = sum.into_iter().map(|s| s / count as f64).collect();
            }
        }
    }

    Ok(KMeansResult { labels, centers })
}
