//! In-memory link graph with key lookups.
//!
//! Uses `petgraph` for the bipartite graph and `HashMap`s for O(1) node lookups
//! by CLO or aggregate key. Rebuilt from raw link rows on every invocation.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::outcome::{AggregateKey, AggregateKind, CloKey, WeightLevel};

use super::{LinkEdge, LinkKind, OutcomeNode, PloPiLink};

/// Aggregate-to-CLO dependency index.
///
/// An aggregate that was registered but never linked has an empty dependency
/// set; the rollup treats it as ratio 0.
#[derive(Debug, Clone, Default)]
pub struct LinkGraphIndex {
    /// Directed graph: aggregate → CLO (contributes), PLO → PI (relates).
    graph: DiGraph<OutcomeNode, LinkKind>,
    /// AggregateKey → NodeIndex.
    aggregate_nodes: HashMap<AggregateKey, NodeIndex>,
    /// CloKey → NodeIndex.
    clo_nodes: HashMap<CloKey, NodeIndex>,
}

impl LinkGraphIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from the three raw edge lists.
    ///
    /// Rows with a blank code are skipped.
    pub fn from_edges(plo_clo: &[LinkEdge], pi_clo: &[LinkEdge], plo_pi: &[PloPiLink]) -> Self {
        let mut index = Self::new();
        let mut skipped = 0usize;

        let weighted = plo_clo
            .iter()
            .map(|e| (AggregateKind::Plo, e))
            .chain(pi_clo.iter().map(|e| (AggregateKind::Pi, e)));
        for (kind, edge) in weighted {
            match edge.clo_key() {
                Some(clo) => {
                    index.link(AggregateKey::new(kind, edge.code.trim()), clo, edge.weight)
                }
                None => skipped += 1,
            }
        }

        for row in plo_pi {
            let (plo, pi) = (row.plo.trim(), row.pi.trim());
            if plo.is_empty() || pi.is_empty() {
                skipped += 1;
                continue;
            }
            index.relate(plo, pi);
        }

        if skipped > 0 {
            tracing::debug!(skipped, "skipped link rows with missing identifiers");
        }
        tracing::debug!(
            nodes = index.node_count(),
            edges = index.edge_count(),
            "built link graph index"
        );
        index
    }

    fn ensure_aggregate(&mut self, key: AggregateKey) -> NodeIndex {
        if let Some(&idx) = self.aggregate_nodes.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(OutcomeNode::Aggregate(key.clone()));
        self.aggregate_nodes.insert(key, idx);
        idx
    }

    fn ensure_clo(&mut self, key: CloKey) -> NodeIndex {
        if let Some(&idx) = self.clo_nodes.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(OutcomeNode::Clo(key.clone()));
        self.clo_nodes.insert(key, idx);
        idx
    }

    /// Make an aggregate known even if it has no linked CLOs.
    pub fn register_aggregate(&mut self, key: AggregateKey) {
        self.ensure_aggregate(key);
    }

    /// Add a contribution edge. A repeated (aggregate, CLO) pair keeps the
    /// highest weight level seen.
    pub fn link(&mut self, aggregate: AggregateKey, clo: CloKey, weight: WeightLevel) {
        let from = self.ensure_aggregate(aggregate);
        let to = self.ensure_clo(clo);

        let existing = self
            .graph
            .edges_connecting(from, to)
            .find_map(|e| match *e.weight() {
                LinkKind::Contributes(w) => Some((e.id(), w)),
                LinkKind::Relates => None,
            });
        match existing {
            Some((edge, current)) if weight > current => {
                self.graph[edge] = LinkKind::Contributes(weight);
            }
            Some(_) => {}
            None => {
                self.graph.add_edge(from, to, LinkKind::Contributes(weight));
            }
        }
    }

    /// Record that a PI belongs to a PLO. Idempotent.
    pub fn relate(&mut self, plo: &str, pi: &str) {
        let from = self.ensure_aggregate(AggregateKey::plo(plo));
        let to = self.ensure_aggregate(AggregateKey::pi(pi));
        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, LinkKind::Relates);
        }
    }

    /// CLOs an aggregate depends on, with weight levels, sorted by CLO key.
    ///
    /// Empty for unknown aggregates and for aggregates without linked CLOs.
    pub fn dependencies(&self, key: &AggregateKey) -> Vec<(CloKey, WeightLevel)> {
        let Some(&idx) = self.aggregate_nodes.get(key) else {
            return vec![];
        };
        let mut deps: Vec<(CloKey, WeightLevel)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter_map(|e| match (*e.weight(), &self.graph[e.target()]) {
                (LinkKind::Contributes(w), OutcomeNode::Clo(clo)) => Some((clo.clone(), w)),
                _ => None,
            })
            .collect();
        deps.sort_by(|a, b| a.0.cmp(&b.0));
        deps
    }

    /// Number of CLOs an aggregate depends on.
    pub fn dependency_count(&self, key: &AggregateKey) -> usize {
        self.aggregate_nodes.get(key).map_or(0, |&idx| {
            self.graph
                .edges_directed(idx, Direction::Outgoing)
                .filter(|e| matches!(e.weight(), LinkKind::Contributes(_)))
                .count()
        })
    }

    /// Whether an aggregate is known to the index.
    pub fn has_aggregate(&self, key: &AggregateKey) -> bool {
        self.aggregate_nodes.contains_key(key)
    }

    /// All known aggregates of a kind, sorted by code.
    pub fn aggregates(&self, kind: AggregateKind) -> Vec<AggregateKey> {
        let mut keys: Vec<AggregateKey> = self
            .aggregate_nodes
            .keys()
            .filter(|k| k.kind == kind)
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// All CLOs reachable from any aggregate, sorted.
    pub fn clo_keys(&self) -> Vec<CloKey> {
        let mut keys: Vec<CloKey> = self.clo_nodes.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Aggregates a CLO feeds, sorted.
    pub fn dependents_of(&self, clo: &CloKey) -> Vec<AggregateKey> {
        let Some(&idx) = self.clo_nodes.get(clo) else {
            return vec![];
        };
        let mut keys: Vec<AggregateKey> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .filter_map(|e| match &self.graph[e.source()] {
                OutcomeNode::Aggregate(key) => Some(key.clone()),
                OutcomeNode::Clo(_) => None,
            })
            .collect();
        keys.sort();
        keys
    }

    /// PI codes related to a PLO, sorted.
    pub fn pis_for_plo(&self, plo: &str) -> Vec<String> {
        self.related(&AggregateKey::plo(plo), Direction::Outgoing)
    }

    /// PLO codes a PI belongs to, sorted.
    pub fn plos_for_pi(&self, pi: &str) -> Vec<String> {
        self.related(&AggregateKey::pi(pi), Direction::Incoming)
    }

    fn related(&self, key: &AggregateKey, dir: Direction) -> Vec<String> {
        let Some(&idx) = self.aggregate_nodes.get(key) else {
            return vec![];
        };
        let mut codes: Vec<String> = self
            .graph
            .edges_directed(idx, dir)
            .filter(|e| matches!(e.weight(), LinkKind::Relates))
            .filter_map(|e| {
                let other = if dir == Direction::Outgoing {
                    e.target()
                } else {
                    e.source()
                };
                match &self.graph[other] {
                    OutcomeNode::Aggregate(k) => Some(k.code.clone()),
                    OutcomeNode::Clo(_) => None,
                }
            })
            .collect();
        codes.sort();
        codes
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Read-only access to the underlying graph.
    pub fn graph(&self) -> &DiGraph<OutcomeNode, LinkKind> {
        &self.graph
    }
}
