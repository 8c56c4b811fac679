//! Student clustering for heatmap ordering.
//!
//! Runs deterministic k-means for every candidate k, scores each labelling
//! with the mean silhouette coefficient and keeps the best. Rows are then
//! stably grouped by cluster label so same-cluster students sit together.
//!
//! Clustering only runs when the row count lies inside the configured guard
//! (6..=300 by default). Outside it the outcome is [`ClusterOutcome::Skipped`]
//! with the natural input order. Skipping is not an error.

pub mod kmeans;
pub mod metrics;
pub mod silhouette;

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::ClusterError;
use crate::matrix::FeatureMatrix;

pub use kmeans::{KMeansResult, kmeans};
pub use metrics::DistanceMatrix;
pub use silhouette::silhouette;

/// Result type for clustering operations.
pub type ClusterResult<T> = std::result::Result<T, ClusterError>;

/// Tuning for one clustering request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Fewest rows worth clustering.
    pub min_rows: usize,
    /// Most rows clustered before the O(n²) silhouette cost is refused.
    pub max_rows: usize,
    /// Upper cap on candidate k.
    pub max_k: usize,
    /// Fixed k-means rounds per candidate.
    pub iterations: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            min_rows: 6,
            max_rows: 300,
            max_k: 6,
            iterations: 10,
        }
    }
}

/// Candidate cluster counts for `n` rows: `2..=min(max_k, max(2, floor(sqrt(n))))`.
pub fn candidate_ks(n: usize, max_k: usize) -> RangeInclusive<usize> {
    2..=max_k.max(2).min(n.isqrt().max(2))
}

/// Silhouette score of one candidate k.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateScore {
    pub k: usize,
    pub silhouette: f64,
}

/// The winning labelling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAssignment {
    /// Cluster label in `0..k` per input row.
    pub labels: Vec<usize>,
    pub k: usize,
    pub silhouette: f64,
    pub centers: Vec<Vec<f64>>,
    /// Every candidate tried, ascending k.
    pub candidates: Vec<CandidateScore>,
}

/// Why clustering did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Row count outside the guard range.
    RowCount { rows: usize, min: usize, max: usize },
    /// No feature columns to separate rows by.
    NoFeatures { rows: usize },
}

impl SkipReason {
    pub fn rows(&self) -> usize {
        match *self {
            SkipReason::RowCount { rows, .. } | SkipReason::NoFeatures { rows } => rows,
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::RowCount { rows, min, max } => {
                write!(f, "{rows} rows outside clustering range {min}..={max}")
            }
            SkipReason::NoFeatures { rows } => write!(f, "{rows} rows but no feature columns"),
        }
    }
}

/// Outcome of a clustering request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClusterOutcome {
    Clustered(ClusterAssignment),
    Skipped(SkipReason),
}

impl ClusterOutcome {
    pub fn assignment(&self) -> Option<&ClusterAssignment> {
        match self {
            ClusterOutcome::Clustered(a) => Some(a),
            ClusterOutcome::Skipped(_) => None,
        }
    }

    pub fn is_clustered(&self) -> bool {
        matches!(self, ClusterOutcome::Clustered(_))
    }

    /// Display order of the input rows: grouped by cluster, or natural order when skipped.
    pub fn row_order(&self) -> Vec<usize> {
        match self {
            ClusterOutcome::Clustered(a) => cluster_order(&a.labels),
            ClusterOutcome::Skipped(reason) => (0..reason.rows()).collect(),
        }
    }
}

/// Row indices stably sorted by label ascending.
pub fn cluster_order(labels: &[usize]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..labels.len()).collect();
    order.sort_by_key(|&i| labels[i]);
    order
}

/// Cluster the rows of a (normalized) matrix, choosing k automatically.
///
/// Ties between candidate scores go to the smaller k.
pub fn auto_cluster(points: &[Vec<f64>], config: &ClusterConfig) -> ClusterResult<ClusterOutcome> {
    let n = points.len();
    let dim = metrics::common_dimension(points)?;

    let min = config.min_rows.max(2);
    if n < min || n > config.max_rows {
        tracing::info!(rows = n, min, max = config.max_rows, "clustering skipped");
        return Ok(ClusterOutcome::Skipped(SkipReason::RowCount {
            rows: n,
            min,
            max: config.max_rows,
        }));
    }
    if dim == 0 {
        tracing::info!(rows = n, "clustering skipped: no feature columns");
        return Ok(ClusterOutcome::Skipped(SkipReason::NoFeatures { rows: n }));
    }

    let distances = DistanceMatrix::compute(points);
    let mut candidates = Vec::new();
    let mut best: Option<(KMeansResult, usize, f64)> = None;

    for k in candidate_ks(n, config.max_k) {
        let run = kmeans(points, k, config.iterations)?;
        let score = silhouette(&distances, &run.labels, k)?;
        tracing::debug!(k, silhouette = score, "scored candidate");
        candidates.push(CandidateScore {
            k,
            silhouette: score,
        });
        if best.as_ref().is_none_or(|(_, _, s)| score > *s) {
            best = Some((run, k, score));
        }
    }

    // candidate_ks always yields k = 2, and n >= 2 here.
    let (run, k, score) = best.ok_or(ClusterError::InvalidK { k: 2, n })?;
    tracing::info!(rows = n, features = dim, k, silhouette = score, "clustered rows");

    Ok(ClusterOutcome::Clustered(ClusterAssignment {
        labels: run.labels,
        k,
        silhouette: score,
        centers: run.centers,
        candidates,
    }))
}

/// Legend entry for one cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub label: usize,
    pub size: usize,
    /// Input row indices, ascending.
    pub members: Vec<usize>,
    /// Column means over the members, in the matrix's own scale.
    pub mean_profile: Vec<f64>,
}

/// Size, members and mean profile of every cluster `0..k`, including empty ones.
pub fn summarize(matrix: &FeatureMatrix, assignment: &ClusterAssignment) -> Vec<ClusterSummary> {
    (0..assignment.k)
        .map(|label| {
            let members: Vec<usize> = assignment
                .labels
                .iter()
                .enumerate()
                .filter(|&(_, &l)| l == label)
                .map(|(i, _)| i)
                .collect();
            let mut mean_profile = vec![0.0; matrix.n_cols()];
            for &i in &members {
                if let Some(row) = matrix.row(i) {
                    for (m, v) in mean_profile.iter_mut().zip(row) {
                        *m += v;
                    }
                }
            }
            if !members.is_empty() {
                let size = members.len() as f64;
                mean_profile.iter_mut().for_each(|m| *m /= size);
            }
            ClusterSummary {
                label,
                size: members.len(),
                members,
                mean_profile,
            }
        })
        .collect()
}
