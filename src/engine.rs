//! Engine facade: top-level API for the rollup and clustering pipeline.
//!
//! The `Engine` holds only configuration. Every call builds its facts, link
//! index and matrices fresh from the snapshot it is given, so identical input
//! always produces identical output.

use crate::achievement::{self, AchievementFacts};
use crate::cluster::{self, ClusterConfig, ClusterOutcome, ClusterSummary};
use crate::config::AnalyticsConfig;
use crate::error::{EngineError, RollupResult};
use crate::graph::LinkGraphIndex;
use crate::matrix::FeatureMatrix;
use crate::outcome::{AggregateKind, CloKey, Granularity, Student};
use crate::rollup::{self, OutcomeProgress, RollupFormula};
use crate::snapshot::Snapshot;

/// Runtime configuration for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub cluster: ClusterConfig,
    /// Formula behind PI/PLO heatmap columns.
    pub heatmap_formula: RollupFormula,
    /// Formula behind the student progress view.
    pub progress_formula: RollupFormula,
}

impl Default for EngineConfig {
    fn default() -> Self {
        AnalyticsConfig::default().to_engine_config()
    }
}

impl AnalyticsConfig {
    /// Convert to the engine's runtime configuration.
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            cluster: self.to_cluster_config(),
            heatmap_formula: self.heatmap_formula,
            progress_formula: self.progress_formula,
        }
    }
}

/// Resolved facts and link index for one snapshot.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub facts: AchievementFacts,
    pub index: LinkGraphIndex,
    /// Achievement rows dropped for missing identifiers.
    pub dropped_records: usize,
}

/// A clustered (or naturally ordered) heatmap.
#[derive(Debug, Clone)]
pub struct HeatmapReport {
    pub granularity: Granularity,
    /// Roster the rows were built from, one entry per matrix row.
    pub students: Vec<Student>,
    /// Rollup formula behind the columns; `None` for CLO columns.
    pub formula: Option<RollupFormula>,
    /// Raw values, rows in roster order.
    pub matrix: FeatureMatrix,
    /// Column-normalized values the clustering ran on.
    pub normalized: FeatureMatrix,
    pub clustering: ClusterOutcome,
    /// Display order of the roster rows.
    pub row_order: Vec<usize>,
    /// Per-cluster legend over the raw values; empty when clustering was skipped.
    pub summaries: Vec<ClusterSummary>,
    pub dropped_records: usize,
}

impl HeatmapReport {
    /// Raw matrix with rows in display order.
    pub fn display_matrix(&self) -> RollupResult<FeatureMatrix> {
        Ok(self.matrix.reordered(&self.row_order)?)
    }
}

/// One student's progress across every PI or PLO.
#[derive(Debug, Clone)]
pub struct StudentProgress {
    pub student: Student,
    pub kind: AggregateKind,
    pub formula: RollupFormula,
    pub outcomes: Vec<OutcomeProgress>,
}

/// The rollup analytics engine.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create an engine from validated analytics configuration.
    pub fn new(config: &AnalyticsConfig) -> RollupResult<Self> {
        config.validate()?;
        Ok(Self {
            config: config.to_engine_config(),
        })
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve achievement facts and build the link index.
    pub fn prepare(&self, snapshot: &Snapshot) -> Prepared {
        let resolved = achievement::resolve(&snapshot.records);
        Prepared {
            facts: resolved.facts,
            index: snapshot.link_index(),
            dropped_records: resolved.dropped,
        }
    }

    /// Raw feature matrix for a granularity, rows in roster order.
    pub fn feature_matrix(
        &self,
        prepared: &Prepared,
        students: &[Student],
        granularity: Granularity,
        formula: RollupFormula,
    ) -> FeatureMatrix {
        match granularity.aggregate_kind() {
            None => {
                let mut clos: Vec<CloKey> = prepared.index.clo_keys();
                clos.extend(prepared.facts.clo_keys());
                clos.sort();
                clos.dedup();
                FeatureMatrix::from_facts(students, &clos, &prepared.facts)
            }
            Some(kind) => {
                let outcomes = prepared.index.aggregates(kind);
                let table = rollup::rollup(
                    &prepared.index,
                    &prepared.facts,
                    students,
                    &outcomes,
                    formula,
                );
                FeatureMatrix::from_rollup(&table)
            }
        }
    }

    /// Heatmap with the configured heatmap formula.
    pub fn heatmap(&self, snapshot: &Snapshot, granularity: Granularity) -> RollupResult<HeatmapReport> {
        self.heatmap_with(snapshot, granularity, self.config.heatmap_formula)
    }

    /// Full pipeline: resolve, roll up, build, normalize, cluster, order.
    pub fn heatmap_with(
        &self,
        snapshot: &Snapshot,
        granularity: Granularity,
        formula: RollupFormula,
    ) -> RollupResult<HeatmapReport> {
        let prepared = self.prepare(snapshot);
        let matrix = self.feature_matrix(&prepared, &snapshot.students, granularity, formula);
        let normalized = matrix.normalized();

        tracing::info!(
            students = matrix.n_rows(),
            columns = matrix.n_cols(),
            %granularity,
            %formula,
            "built feature matrix"
        );

        let clustering = cluster::auto_cluster(normalized.rows(), &self.config.cluster)?;
        let row_order = clustering.row_order();
        let summaries = clustering
            .assignment()
            .map(|a| cluster::summarize(&matrix, a))
            .unwrap_or_default();

        Ok(HeatmapReport {
            granularity,
            students: snapshot.students.clone(),
            formula: granularity.aggregate_kind().map(|_| formula),
            matrix,
            normalized,
            clustering,
            row_order,
            summaries,
            dropped_records: prepared.dropped_records,
        })
    }

    /// Progress view with the configured progress formula.
    pub fn student_progress(
        &self,
        snapshot: &Snapshot,
        student: &str,
        kind: AggregateKind,
    ) -> RollupResult<StudentProgress> {
        self.student_progress_with(snapshot, student, kind, self.config.progress_formula)
    }

    pub fn student_progress_with(
        &self,
        snapshot: &Snapshot,
        student: &str,
        kind: AggregateKind,
        formula: RollupFormula,
    ) -> RollupResult<StudentProgress> {
        let found = snapshot
            .student(student)
            .ok_or_else(|| EngineError::UnknownStudent {
                student: student.to_string(),
            })?;
        let prepared = self.prepare(snapshot);
        let outcomes = rollup::progress(&prepared.index, &prepared.facts, &found.id, kind, formula);

        tracing::info!(student, %kind, %formula, outcomes = outcomes.len(), "computed progress");

        Ok(StudentProgress {
            student: found.clone(),
            kind,
            formula,
            outcomes,
        })
    }
}
