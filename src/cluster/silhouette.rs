//! Mean silhouette coefficient of a labelling.
//!
//! ```text
//! s(i) = (b(i) - a(i)) / max(a(i), b(i))
//! ```
//!
//! - `a(i)`: mean distance to the other members of i's cluster, 0 for a singleton
//! - `b(i)`: smallest mean distance to the members of another non-empty cluster
//!
//! The denominator is replaced by 1 when both distances are 0. A point with no
//! other non-empty cluster to compare against scores 0.

use crate::error::ClusterError;

use super::ClusterResult;
use super::metrics::DistanceMatrix;

/// Per-point silhouette values.
pub fn silhouette_samples(
    distances: &DistanceMatrix,
    labels: &[usize],
    k: usize,
) -> ClusterResult<Vec<f64>> {
    let n = distances.len();
    if labels.len() != n {
        return Err(ClusterError::DimensionMismatch {
            index: 0,
            expected: n,
            actual: labels.len(),
        });
    }
    if let Some(&label) = labels.iter().find(|&&l| l >= k) {
        return Err(ClusterError::LabelOutOfRange { label, k });
    }

    let mut sizes = vec![0usize; k];
    for &l in labels {
        sizes[l] += 1;
    }

    let mut scores = Vec::with_capacity(n);
    let mut sums = vec![0.0; k];
    for i in 0..n {
        sums.iter_mut().for_each(|s| *s = 0.0);
        for j in 0..n {
            if i != j {
                sums[labels[j]] += distances.get(i, j);
            }
        }

        let own = labels[i];
        let a = if sizes[own] > 1 {
            sums[own] / (sizes[own] - 1) as f64
        } else {
            0.0
        };
        let b = (0..k)
            .filter(|&c| c != own && sizes[c] > 0)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(None, |acc: Option<f64>, m| Some(acc.map_or(m, |x| x.min(m))));

        let s = match b {
            None => 0.0,
            Some(b) => {
                let denom = a.max(b);
                let denom = if denom == 0.0 { 1.0 } else { denom };
                (b - a) / denom
            }
        };
        scores.push(s);
    }
    Ok(scores)
}

/// Mean silhouette over all points; 0 for an empty point set.
pub fn silhouette(distances: &DistanceMatrix, labels: &[usize], k: usize) -> ClusterResult<f64> {
    let samples = silhouette_samples(distances, labels, k)?;
    if samples.is_empty() {
        return Ok(0.0);
    }
    Ok(samples.iter().sum::<f64>() / samples.len() as f64)
}
