//! Core outcome types for the rollup engine.
//!
//! Students are rows of every report; outcomes are the nodes of the linkage
//! graph. A [`CloKey`] identifies a course-scoped leaf outcome, an
//! [`AggregateKey`] a program-level PI or PLO. Link edges carry a
//! [`WeightLevel`] that only the weighted rollup reads.

use serde::{Deserialize, Serialize};

/// A student on the roster of one curriculum framework.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Student {
    /// Stable identifier, the key achievement records refer to.
    pub id: String,
    /// Display code shown on the heatmap axis.
    #[serde(default)]
    pub code: String,
}

impl Student {
    pub fn new(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
        }
    }

    /// Display code, falling back to the id when no code was supplied.
    pub fn display_code(&self) -> &str {
        if self.code.trim().is_empty() {
            &self.id
        } else {
            &self.code
        }
    }
}

/// Composite key of a Course Learning Outcome.
///
/// CLO codes are only unique within a course, so the course code is part of
/// the key. Ordering is by course, then CLO code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CloKey {
    pub course_code: String,
    pub clo_code: String,
}

impl CloKey {
    pub fn new(course_code: impl Into<String>, clo_code: impl Into<String>) -> Self {
        Self {
            course_code: course_code.into(),
            clo_code: clo_code.into(),
        }
    }
}

impl std::fmt::Display for CloKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.course_code, self.clo_code)
    }
}

/// Which kind of aggregate outcome a code names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateKind {
    /// Performance Indicator.
    Pi,
    /// Program Learning Outcome.
    Plo,
}

impl std::fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateKind::Pi => write!(f, "PI"),
            AggregateKind::Plo => write!(f, "PLO"),
        }
    }
}

/// Key of an aggregate outcome. A PI and a PLO sharing a code stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AggregateKey {
    pub kind: AggregateKind,
    pub code: String,
}

impl AggregateKey {
    pub fn new(kind: AggregateKind, code: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
        }
    }

    pub fn plo(code: impl Into<String>) -> Self {
        Self::new(AggregateKind::Plo, code)
    }

    pub fn pi(code: impl Into<String>) -> Self {
        Self::new(AggregateKind::Pi, code)
    }
}

impl std::fmt::Display for AggregateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Column granularity of a feature matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One column per CLO; cells are exactly 0 or 1.
    Clo,
    /// One column per PI; cells are rollup ratios.
    Pi,
    /// One column per PLO; cells are rollup ratios.
    Plo,
}

impl Granularity {
    /// The aggregate kind behind this granularity, `None` for CLO columns.
    pub fn aggregate_kind(self) -> Option<AggregateKind> {
        match self {
            Granularity::Clo => None,
            Granularity::Pi => Some(AggregateKind::Pi),
            Granularity::Plo => Some(AggregateKind::Plo),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Clo => write!(f, "CLO"),
            Granularity::Pi => write!(f, "PI"),
            Granularity::Plo => write!(f, "PLO"),
        }
    }
}

/// Strength of a CLO's contribution to an aggregate outcome, 1 (weak) to 4 (strong).
///
/// Out-of-range levels are rejected on construction and on deserialization, so
/// every `WeightLevel` the engine sees is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct WeightLevel(u8);

impl WeightLevel {
    pub const MIN: WeightLevel = WeightLevel(1);
    pub const MAX: WeightLevel = WeightLevel(4);

    /// Create a weight level, returning `None` outside 1..=4.
    pub fn new(level: u8) -> Option<Self> {
        (Self::MIN.0..=Self::MAX.0)
            .contains(&level)
            .then_some(WeightLevel(level))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for WeightLevel {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        WeightLevel::new(level).ok_or_else(|| format!("weight level {level} outside 1..=4"))
    }
}

impl From<WeightLevel> for u8 {
    fn from(level: WeightLevel) -> Self {
        level.0
    }
}

impl std::fmt::Display for WeightLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}", self.0)
    }
}
