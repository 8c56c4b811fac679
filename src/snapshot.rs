//! Input snapshot: everything one computation needs, already in memory.
//!
//! The data-access layer outside this crate assembles a [`Snapshot`] for one
//! curriculum framework. The CLI reads the same shape from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::achievement::AchievementRecord;
use crate::error::SnapshotError;
use crate::graph::{LinkEdge, LinkGraphIndex, PloPiLink};
use crate::outcome::AggregateKey;
use crate::outcome::Student;

/// Raw rows for one curriculum framework.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Roster, in display order.
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub records: Vec<AchievementRecord>,
    #[serde(default)]
    pub plo_clo: Vec<LinkEdge>,
    #[serde(default)]
    pub pi_clo: Vec<LinkEdge>,
    #[serde(default)]
    pub plo_pi: Vec<PloPiLink>,
    /// PLO catalogue; lets PLOs without any linked CLO still get a column.
    #[serde(default)]
    pub plos: Vec<String>,
    /// PI catalogue.
    #[serde(default)]
    pub pis: Vec<String>,
}

impl Snapshot {
    pub fn from_json_str(content: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(content).map_err(|e| SnapshotError::Parse {
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path).map_err(|e| SnapshotError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json_str(&content)
    }

    /// Link graph over the snapshot's edges, with catalogue outcomes registered.
    pub fn link_index(&self) -> LinkGraphIndex {
        let mut index = LinkGraphIndex::from_edges(&self.plo_clo, &self.pi_clo, &self.plo_pi);
        let catalogue = self
            .plos
            .iter()
            .map(|code| AggregateKey::plo(code.trim()))
            .chain(self.pis.iter().map(|code| AggregateKey::pi(code.trim())));
        for key in catalogue.filter(|k| !k.code.is_empty()) {
            index.register_aggregate(key);
        }
        index
    }

    /// Roster entry by id, ignoring surrounding whitespace on either side.
    pub fn student(&self, id: &str) -> Option<&Student> {
        let id = id.trim();
        self.students.iter().find(|s| s.id.trim() == id)
    }
}
