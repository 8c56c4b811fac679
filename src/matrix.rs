//! Dense student × outcome feature matrices and column normalization.

use serde::Serialize;

use crate::achievement::AchievementFacts;
use crate::error::MatrixError;
use crate::outcome::{CloKey, Student};
use crate::rollup::RollupTable;

/// Result type for matrix operations.
pub type MatrixResult<T> = std::result::Result<T, MatrixError>;

/// Rows = students, columns = outcomes, every cell populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureMatrix {
    rows: Vec<String>,
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
}

/// Range and mean of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl FeatureMatrix {
    /// Build a matrix from explicit values, rejecting ragged input.
    pub fn new(rows: Vec<String>, columns: Vec<String>, values: Vec<Vec<f64>>) -> MatrixResult<Self> {
        if rows.len() != values.len() {
            return Err(MatrixError::LabelMismatch {
                rows: values.len(),
                labels: rows.len(),
            });
        }
        if let Some((row, r)) = values
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            return Err(MatrixError::Ragged {
                row,
                expected: columns.len(),
                actual: r.len(),
            });
        }
        Ok(Self {
            rows,
            columns,
            values,
        })
    }

    /// CLO matrix: 1.0 where the resolved fact is `achieved`, otherwise 0.0.
    pub fn from_facts(students: &[Student], clos: &[CloKey], facts: &AchievementFacts) -> Self {
        let values = students
            .iter()
            .map(|s| {
                clos.iter()
                    .map(|clo| if facts.is_achieved(&s.id, clo) { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect();
        Self {
            rows: students.iter().map(|s| s.id.clone()).collect(),
            columns: clos.iter().map(ToString::to_string).collect(),
            values,
        }
    }

    /// PI/PLO matrix straight from a rollup table.
    pub fn from_rollup(table: &RollupTable) -> Self {
        Self {
            rows: table.students().to_vec(),
            columns: table.outcomes().iter().map(ToString::to_string).collect(),
            values: table.rows().to_vec(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Row labels (student ids).
    pub fn row_labels(&self) -> &[String] {
        &self.rows
    }

    /// Column labels (CLO keys or aggregate codes).
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn row(&self, i: usize) -> Option<&[f64]> {
        self.values.get(i).map(Vec::as_slice)
    }

    pub fn value(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i)?.get(j).copied()
    }

    /// Per-column min, max and mean. Empty matrices yield zeros.
    pub fn column_stats(&self) -> Vec<ColumnStats> {
        let n = self.values.len();
        (0..self.columns.len())
            .map(|j| {
                if n == 0 {
                    return ColumnStats {
                        min: 0.0,
                        max: 0.0,
                        mean: 0.0,
                    };
                }
                let (mut min, mut max, mut sum) = (f64::INFINITY, f64::NEG_INFINITY, 0.0);
                for row in &self.values {
                    let v = row[j];
                    min = min.min(v);
                    max = max.max(v);
                    sum += v;
                }
                ColumnStats {
                    min,
                    max,
                    mean: sum / n as f64,
                }
            })
            .collect()
    }

    /// Per-column min–max scaling to [0,1].
    ///
    /// A constant column has its range replaced by 1 and so becomes all 0.
    pub fn normalized(&self) -> Self {
        let stats = self.column_stats();
        let values = self
            .values
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&stats)
                    .map(|(&v, s)| {
                        let range = s.max - s.min;
                        let range = if range == 0.0 { 1.0 } else { range };
                        (v - s.min) / range
                    })
                    .collect()
            })
            .collect();
        Self {
            rows: self.rows.clone(),
            columns: self.columns.clone(),
            values,
        }
    }

    /// Rows permuted into `order`; `order` must be a permutation of `0..n_rows`.
    pub fn reordered(&self, order: &[usize]) -> MatrixResult<Self> {
        let n = self.rows.len();
        if order.len() != n {
            return Err(MatrixError::InvalidOrder {
                message: format!("expected {n} indices, got {}", order.len()),
            });
        }
        let mut seen = vec![false; n];
        for &i in order {
            if i >= n || std::mem::replace(&mut seen[i], true) {
                return Err(MatrixError::InvalidOrder {
                    message: format!("index {i} is out of range or repeated"),
                });
            }
        }
        Ok(Self {
            rows: order.iter().map(|&i| self.rows[i].clone()).collect(),
            columns: self.columns.clone(),
            values: order.iter().map(|&i| self.values[i].clone()).collect(),
        })
    }
}
