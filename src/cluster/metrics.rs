//! Euclidean distances and the pairwise distance matrix used for silhouette scoring.

use crate::error::ClusterError;

use super::ClusterResult;

/// Squared Euclidean distance. Enough for nearest-center comparisons.
#[inline]
pub fn euclidean_distance_squared(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[inline]
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    euclidean_distance_squared(a, b).sqrt()
}

/// Feature count shared by every point, or an error naming the first outlier.
///
/// An empty point set has dimension 0.
pub fn common_dimension(points: &[Vec<f64>]) -> ClusterResult<usize> {
    let Some(first) = points.first() else {
        return Ok(0);
    };
    let expected = first.len();
    match points.iter().position(|p| p.len() != expected) {
        Some(index) => Err(ClusterError::DimensionMismatch {
            index,
            expected,
            actual: points[index].len(),
        }),
        None => Ok(expected),
    }
}

/// Symmetric n × n Euclidean distance matrix, stored flat.
///
/// Computed once per clustering request and shared by every candidate k.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    pub fn compute(points: &[Vec<f64>]) -> Self {
        let n = points.len();
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = euclidean_distance(&points[i], &points[j]);
                data[i * n + j] = d;
                data[j * n + i] = d;
            }
        }
        Self { n, data }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }
}
