//! Rich diagnostic error types for the rollup engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. Lenient data policies (malformed rows,
//! empty dependency sets, constant columns, out-of-range roster sizes) never
//! surface here; these errors signal bad configuration, unreadable input files,
//! or a caller violating a structural invariant.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;

/// Top-level error type for the rollup engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum RollupError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Matrix(#[from] MatrixError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

// ---------------------------------------------------------------------------
// Snapshot errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SnapshotError {
    #[error("failed to read snapshot: {path}")]
    #[diagnostic(
        code(rollup::snapshot::read),
        help("Ensure the snapshot file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse snapshot: {message}")]
    #[diagnostic(
        code(rollup::snapshot::parse),
        help(
            "The snapshot must be a JSON object with optional `students`, `records`, \
             `plo_clo`, `pi_clo`, `plo_pi`, `plos` and `pis` arrays. \
             Weight levels must be integers between 1 and 4 and timestamps RFC 3339."
        )
    )]
    Parse { message: String },
}

// ---------------------------------------------------------------------------
// Matrix errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum MatrixError {
    #[error("ragged matrix: row {row} has {actual} values, expected {expected}")]
    #[diagnostic(
        code(rollup::matrix::ragged),
        help("Every row of a feature matrix must carry one value per column.")
    )]
    Ragged {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("matrix has {rows} rows but {labels} row labels")]
    #[diagnostic(
        code(rollup::matrix::label_mismatch),
        help("Supply exactly one row label (student id) per row of values.")
    )]
    LabelMismatch { rows: usize, labels: usize },

    #[error("invalid row order: {message}")]
    #[diagnostic(
        code(rollup::matrix::invalid_order),
        help("A row order must be a permutation of 0..n_rows, each index appearing once.")
    )]
    InvalidOrder { message: String },
}

// ---------------------------------------------------------------------------
// Cluster errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ClusterError {
    #[error("point {index} has dimension {actual}, expected {expected}")]
    #[diagnostic(
        code(rollup::cluster::dim_mismatch),
        help("All points passed to the clustering engine must share the same feature count.")
    )]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("invalid cluster count {k} for {n} points")]
    #[diagnostic(
        code(rollup::cluster::invalid_k),
        help("k-means needs 1 <= k <= n. Use `auto_cluster` to pick k automatically.")
    )]
    InvalidK { k: usize, n: usize },

    #[error("label {label} out of range for k = {k}")]
    #[diagnostic(
        code(rollup::cluster::label_out_of_range),
        help("Cluster labels must lie in 0..k.")
    )]
    LabelOutOfRange { label: usize, k: usize },
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("unknown student: {student}")]
    #[diagnostic(
        code(rollup::engine::unknown_student),
        help("The student id is not on the snapshot roster. Check the `students` array.")
    )]
    UnknownStudent { student: String },
}

/// Convenience alias for functions returning rollup results.
pub type RollupResult<T> = std::result::Result<T, RollupError>;
