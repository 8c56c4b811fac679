//! Link graph: which CLOs each PI and PLO depends on.
//!
//! The graph is bipartite. Aggregate outcomes (PI, PLO) point at the CLOs that
//! contribute to them, each edge carrying a [`WeightLevel`]. PLO → PI edges are
//! pure membership and only feed informational lookups.
//!
//! - **Index** ([`LinkGraphIndex`]): `petgraph` structure plus key lookups
//! - **Analytics** ([`analytics`]): coverage and fan-out statistics

pub mod analytics;
pub mod index;

use serde::{Deserialize, Serialize};

use crate::outcome::{CloKey, WeightLevel};

pub use index::LinkGraphIndex;

/// A weighted PLO→CLO or PI→CLO link row.
///
/// Which aggregate kind `code` names is decided by the list the row arrives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEdge {
    /// PLO or PI code.
    pub code: String,
    pub course_code: String,
    pub clo_code: String,
    pub weight: WeightLevel,
}

impl LinkEdge {
    pub fn new(
        code: impl Into<String>,
        course_code: impl Into<String>,
        clo_code: impl Into<String>,
        weight: WeightLevel,
    ) -> Self {
        Self {
            code: code.into(),
            course_code: course_code.into(),
            clo_code: clo_code.into(),
            weight,
        }
    }

    /// Trimmed CLO key, `None` when the row is missing an identifier.
    pub fn clo_key(&self) -> Option<CloKey> {
        let course = self.course_code.trim();
        let clo = self.clo_code.trim();
        if self.code.trim().is_empty() || course.is_empty() || clo.is_empty() {
            return None;
        }
        Some(CloKey::new(course, clo))
    }
}

/// Unweighted PLO↔PI membership row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PloPiLink {
    pub plo: String,
    pub pi: String,
}

impl PloPiLink {
    pub fn new(plo: impl Into<String>, pi: impl Into<String>) -> Self {
        Self {
            plo: plo.into(),
            pi: pi.into(),
        }
    }
}

/// Node payload stored in the petgraph graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutcomeNode {
    Clo(CloKey),
    Aggregate(crate::outcome::AggregateKey),
}

/// Edge payload stored in the petgraph graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Aggregate → CLO contribution.
    Contributes(WeightLevel),
    /// PLO → PI membership.
    Relates,
}
