//! Link graph analytics: CLO fan-out, orphan CLOs and summary statistics.
//!
//! All functions operate on a [`LinkGraphIndex`] reference and return
//! structured results sorted by relevance (fan-out desc, then key).

use std::collections::BTreeSet;

use serde::Serialize;

use crate::outcome::{AggregateKind, CloKey};

use super::index::LinkGraphIndex;
use super::{LinkKind, OutcomeNode};

// ---------------------------------------------------------------------------
// CLO coverage
// ---------------------------------------------------------------------------

/// How many aggregate outcomes a single CLO feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloCoverage {
    pub clo: CloKey,
    /// Number of PLOs linked to this CLO.
    pub plos: usize,
    /// Number of PIs linked to this CLO.
    pub pis: usize,
    /// Total fan-out (plos + pis).
    pub fan_out: usize,
}

/// Fan-out of every CLO in the graph. Sorted by fan-out desc, then CLO key.
pub fn coverage(index: &LinkGraphIndex) -> Vec<CloCoverage> {
    let mut results: Vec<CloCoverage> = index
        .clo_keys()
        .into_iter()
        .map(|clo| {
            let dependents = index.dependents_of(&clo);
            let plos = dependents
                .iter()
                .filter(|k| k.kind == AggregateKind::Plo)
                .count();
            let pis = dependents.len() - plos;
            CloCoverage {
                clo,
                plos,
                pis,
                fan_out: dependents.len(),
            }
        })
        .collect();
    results.sort_by(|a, b| b.fan_out.cmp(&a.fan_out).then_with(|| a.clo.cmp(&b.clo)));
    results
}

/// CLOs that carry achievement data but feed no aggregate outcome.
///
/// Their facts can never influence a PI or PLO ratio.
pub fn orphan_clos<'a, I>(index: &LinkGraphIndex, observed: I) -> Vec<CloKey>
where
    I: IntoIterator<Item = &'a CloKey>,
{
    let orphans: BTreeSet<CloKey> = observed
        .into_iter()
        .filter(|clo| index.dependents_of(clo).is_empty())
        .cloned()
        .collect();
    orphans.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

/// Counts describing one link graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    pub plos: usize,
    pub pis: usize,
    pub clos: usize,
    /// Aggregate → CLO edges.
    pub contributions: usize,
    /// PLO → PI membership edges.
    pub memberships: usize,
    /// Aggregates with no linked CLO (always roll up to 0).
    pub empty_aggregates: usize,
}

/// Compute node and edge counts by kind.
pub fn stats(index: &LinkGraphIndex) -> LinkStats {
    let graph = index.graph();
    let mut out = LinkStats::default();

    for node in graph.node_weights() {
        match node {
            OutcomeNode::Clo(_) => out.clos += 1,
            OutcomeNode::Aggregate(key) => {
                match key.kind {
                    AggregateKind::Plo => out.plos += 1,
                    AggregateKind::Pi => out.pis += 1,
                }
                if index.dependency_count(key) == 0 {
                    out.empty_aggregates += 1;
                }
            }
        }
    }
    for edge in graph.edge_weights() {
        match edge {
            LinkKind::Contributes(_) => out.contributions += 1,
            LinkKind::Relates => out.memberships += 1,
        }
    }
    out
}

impl std::fmt::Display for LinkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PLOs: {}, PIs: {}, CLOs: {}, contributions: {}, memberships: {}, empty aggregates: {}",
            self.plos, self.pis, self.clos, self.contributions, self.memberships, self.empty_aggregates
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{LinkEdge, PloPiLink};
    use crate::outcome::{AggregateKey, WeightLevel};

    fn w(level: u8) -> WeightLevel {
        WeightLevel::new(level).unwrap()
    }

    fn build_hub_graph() -> LinkGraphIndex {
        // CS1:CLO1 feeds three aggregates, CS1:CLO2 feeds one.
        let mut index = LinkGraphIndex::from_edges(
            &[
                LinkEdge::new("PLO1", "CS1", "CLO1", w(1)),
                LinkEdge::new("PLO2", "CS1", "CLO1", w(2)),
                LinkEdge::new("PLO2", "CS1", "CLO2", w(2)),
            ],
            &[LinkEdge::new("PI1", "CS1", "CLO1", w(3))],
            &[PloPiLink::new("PLO1", "PI1")],
        );
        index.register_aggregate(AggregateKey::plo("PLO3"));
        index
    }

    #[test]
    fn coverage_hub_first() {
        let results = coverage(&build_hub_graph());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].clo, CloKey::new("CS1", "CLO1"));
        assert_eq!(results[0].fan_out, 3);
        assert_eq!(results[0].plos, 2);
        assert_eq!(results[0].pis, 1);
        assert_eq!(results[1].fan_out, 1);
    }

    #[test]
    fn orphans_are_unlinked_observed_clos() {
        let index = build_hub_graph();
        let observed = [
            CloKey::new("CS1", "CLO1"),
            CloKey::new("CS9", "CLO1"),
            CloKey::new("CS9", "CLO1"),
        ];
        assert_eq!(orphan_clos(&index, &observed), vec![CloKey::new("CS9", "CLO1")]);
    }

    #[test]
    fn stats_counts_by_kind() {
        let s = stats(&build_hub_graph());
        assert_eq!(s.plos, 3);
        assert_eq!(s.pis, 1);
        assert_eq!(s.clos, 2);
        assert_eq!(s.contributions, 4);
        assert_eq!(s.memberships, 1);
        assert_eq!(s.empty_aggregates, 1);
    }

    #[test]
    fn stats_empty_graph() {
        assert_eq!(stats(&LinkGraphIndex::new()), LinkStats::default());
    }
}
