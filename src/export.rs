//! Export types for handing reports to the external renderer.
//!
//! These types provide label-resolved, display-ordered representations of a
//! heatmap or a progress view suitable for JSON export. The renderer does its
//! own colour mapping from the raw values.

use serde::{Deserialize, Serialize};

use crate::cluster::ClusterOutcome;
use crate::engine::{HeatmapReport, StudentProgress};
use crate::error::RollupResult;

/// Exported cluster legend entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterExport {
    pub label: usize,
    pub size: usize,
    /// Display codes of the members.
    pub students: Vec<String>,
    /// Mean raw value per column.
    pub mean_profile: Vec<f64>,
}

/// Exported candidate score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateExport {
    pub k: usize,
    pub silhouette: f64,
}

/// Exported heatmap, rows already in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapExport {
    /// CLO, PI or PLO.
    pub granularity: String,
    /// Rollup formula, absent for CLO columns.
    pub formula: Option<String>,
    pub student_ids: Vec<String>,
    /// Display codes, aligned with `student_ids`.
    pub students: Vec<String>,
    pub columns: Vec<String>,
    /// Raw cell values, one row per displayed student.
    pub values: Vec<Vec<f64>>,
    /// Whether clustering ran.
    pub clustered: bool,
    /// Cluster label per displayed row, present only when clustered.
    pub cluster_labels: Option<Vec<usize>>,
    pub k: Option<usize>,
    pub silhouette: Option<f64>,
    pub candidates: Vec<CandidateExport>,
    /// Why clustering was skipped.
    pub skip_reason: Option<String>,
    pub clusters: Vec<ClusterExport>,
    /// Achievement rows dropped for missing identifiers.
    pub dropped_records: usize,
}

impl HeatmapExport {
    /// Resolve display codes against the roster carried by the report.
    pub fn from_report(report: &HeatmapReport) -> RollupResult<Self> {
        let display = report.display_matrix()?;
        let code_of = |i: usize| {
            report
                .students
                .get(i)
                .map(|s| s.display_code().to_string())
                .unwrap_or_else(|| report.matrix.row_labels()[i].clone())
        };

        let (cluster_labels, k, silhouette, candidates, skip_reason) = match &report.clustering {
            ClusterOutcome::Clustered(a) => (
                Some(report.row_order.iter().map(|&i| a.labels[i]).collect()),
                Some(a.k),
                Some(a.silhouette),
                a.candidates
                    .iter()
                    .map(|c| CandidateExport {
                        k: c.k,
                        silhouette: c.silhouette,
                    })
                    .collect(),
                None,
            ),
            ClusterOutcome::Skipped(reason) => (None, None, None, vec![], Some(reason.to_string())),
        };

        let clusters = report
            .summaries
            .iter()
            .map(|s| ClusterExport {
                label: s.label,
                size: s.size,
                students: s.members.iter().map(|&i| code_of(i)).collect(),
                mean_profile: s.mean_profile.clone(),
            })
            .collect();

        Ok(Self {
            granularity: report.granularity.to_string(),
            formula: report.formula.map(|f| f.to_string()),
            student_ids: display.row_labels().to_vec(),
            students: report.row_order.iter().map(|&i| code_of(i)).collect(),
            columns: display.columns().to_vec(),
            values: display.rows().to_vec(),
            clustered: report.clustering.is_clustered(),
            cluster_labels,
            k,
            silhouette,
            candidates,
            skip_reason,
            clusters,
            dropped_records: report.dropped_records,
        })
    }
}

/// Exported progress line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeProgressExport {
    pub code: String,
    pub achieved: usize,
    pub total: usize,
    pub achieved_weight: u32,
    pub total_weight: u32,
    pub ratio: f64,
}

/// Exported student progress view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressExport {
    pub student_id: String,
    pub student: String,
    /// PI or PLO.
    pub kind: String,
    pub formula: String,
    pub outcomes: Vec<OutcomeProgressExport>,
}

impl From<&StudentProgress> for ProgressExport {
    fn from(p: &StudentProgress) -> Self {
        Self {
            student_id: p.student.id.clone(),
            student: p.student.display_code().to_string(),
            kind: p.kind.to_string(),
            formula: p.formula.to_string(),
            outcomes: p
                .outcomes
                .iter()
                .map(|o| OutcomeProgressExport {
                    code: o.outcome.code.clone(),
                    achieved: o.tally.achieved,
                    total: o.tally.total,
                    achieved_weight: o.tally.achieved_weight,
                    total_weight: o.tally.total_weight,
                    ratio: o.ratio,
                })
                .collect(),
        }
    }
}
