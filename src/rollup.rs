//! Rollup: CLO-level binary facts to fractional PI/PLO achievement ratios.
//!
//! Two formulas are in use and they are not equivalent:
//!
//! - [`RollupFormula::Counting`]: every linked CLO counts once,
//!   `achieved CLOs / linked CLOs`. Drives the heatmap.
//! - [`RollupFormula::Weighted`]: every linked CLO counts its weight level,
//!   `Σ weight(achieved) / Σ weight(all)`. Drives the student progress view.
//!
//! Which one a report uses comes from configuration; reports record it.
//! An aggregate with no linked CLOs rolls up to 0 under both.

use serde::{Deserialize, Serialize};

use crate::achievement::AchievementFacts;
use crate::graph::LinkGraphIndex;
use crate::outcome::{AggregateKey, AggregateKind, CloKey, Student, WeightLevel};

/// Rollup semantics for one reporting context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollupFormula {
    /// Each linked CLO contributes 1.
    #[default]
    Counting,
    /// Each linked CLO contributes its weight level (1–4).
    Weighted,
}

impl std::fmt::Display for RollupFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RollupFormula::Counting => write!(f, "counting"),
            RollupFormula::Weighted => write!(f, "weighted"),
        }
    }
}

/// Per-outcome tallies behind a single ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Tally {
    pub achieved: usize,
    pub total: usize,
    pub achieved_weight: u32,
    pub total_weight: u32,
}

impl Tally {
    fn over(deps: &[(CloKey, WeightLevel)], facts: &AchievementFacts, student: &str) -> Self {
        let mut tally = Tally {
            total: deps.len(),
            ..Default::default()
        };
        for (clo, weight) in deps {
            let w = u32::from(weight.get());
            tally.total_weight += w;
            if facts.is_achieved(student, clo) {
                tally.achieved += 1;
                tally.achieved_weight += w;
            }
        }
        tally
    }

    /// Ratio in [0,1] under the given formula; 0 when nothing is linked.
    pub fn ratio(&self, formula: RollupFormula) -> f64 {
        let (num, den) = match formula {
            RollupFormula::Counting => (self.achieved as f64, self.total as f64),
            RollupFormula::Weighted => (
                f64::from(self.achieved_weight),
                f64::from(self.total_weight),
            ),
        };
        if den == 0.0 { 0.0 } else { num / den }
    }
}

/// Ratio for one (student, aggregate) pair.
pub fn ratio(
    index: &LinkGraphIndex,
    facts: &AchievementFacts,
    student: &str,
    outcome: &AggregateKey,
    formula: RollupFormula,
) -> f64 {
    Tally::over(&index.dependencies(outcome), facts, student).ratio(formula)
}

/// Dense table of ratios, rows = students, columns = aggregate outcomes.
#[derive(Debug, Clone, PartialEq)]
pub struct RollupTable {
    students: Vec<String>,
    outcomes: Vec<AggregateKey>,
    ratios: Vec<Vec<f64>>,
    formula: RollupFormula,
}

impl RollupTable {
    pub fn students(&self) -> &[String] {
        &self.students
    }

    pub fn outcomes(&self) -> &[AggregateKey] {
        &self.outcomes
    }

    /// One row of ratios per student, in outcome order.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.ratios
    }

    pub fn formula(&self) -> RollupFormula {
        self.formula
    }

    /// Ratio lookup by key; `None` when the student or outcome was not part of the table.
    pub fn ratio(&self, student: &str, outcome: &AggregateKey) -> Option<f64> {
        let row = self.students.iter().position(|s| s == student)?;
        let col = self.outcomes.iter().position(|o| o == outcome)?;
        Some(self.ratios[row][col])
    }
}

/// Roll up every (student, outcome) pair passed in.
///
/// Total over its input: zero-dependency and unknown outcomes get 0 for
/// every student, students without facts get 0 everywhere.
pub fn rollup(
    index: &LinkGraphIndex,
    facts: &AchievementFacts,
    students: &[Student],
    outcomes: &[AggregateKey],
    formula: RollupFormula,
) -> RollupTable {
    // Dependencies are per outcome, not per student: look them up once.
    let deps: Vec<Vec<(CloKey, WeightLevel)>> =
        outcomes.iter().map(|o| index.dependencies(o)).collect();

    let ratios = students
        .iter()
        .map(|s| {
            deps.iter()
                .map(|d| Tally::over(d, facts, &s.id).ratio(formula))
                .collect()
        })
        .collect();

    tracing::debug!(
        students = students.len(),
        outcomes = outcomes.len(),
        %formula,
        "rolled up aggregate ratios"
    );

    RollupTable {
        students: students.iter().map(|s| s.id.clone()).collect(),
        outcomes: outcomes.to_vec(),
        ratios,
        formula,
    }
}

/// One line of a student's progress view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeProgress {
    pub outcome: AggregateKey,
    #[serde(flatten)]
    pub tally: Tally,
    pub ratio: f64,
}

/// Per-aggregate progress for one student, sorted by outcome code.
pub fn progress(
    index: &LinkGraphIndex,
    facts: &AchievementFacts,
    student: &str,
    kind: AggregateKind,
    formula: RollupFormula,
) -> Vec<OutcomeProgress> {
    index
        .aggregates(kind)
        .into_iter()
        .map(|outcome| {
            let tally = Tally::over(&index.dependencies(&outcome), facts, student);
            OutcomeProgress {
                ratio: tally.ratio(formula),
                outcome,
                tally,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::achievement::{AchievementRecord, AchievementStatus, resolve};
    use crate::graph::LinkEdge;

    fn w(level: u8) -> WeightLevel {
        WeightLevel::new(level).unwrap()
    }

    fn achieved(student: &str, clo: &str) -> AchievementRecord {
        AchievementRecord::new(
            student,
            "CS1",
            clo,
            AchievementStatus::Achieved,
            Utc.timestamp_opt(1, 0).unwrap(),
        )
    }

    /// PLO1 ← CLO1 (L1), CLO2 (L3); student s1 achieved CLO2 only.
    fn fixture() -> (LinkGraphIndex, AchievementFacts) {
        let mut index = LinkGraphIndex::from_edges(
            &[
                LinkEdge::new("PLO1", "CS1", "CLO1", w(1)),
                LinkEdge::new("PLO1", "CS1", "CLO2", w(3)),
            ],
            &[],
            &[],
        );
        index.register_aggregate(AggregateKey::plo("PLO0"));
        let facts = resolve(&[achieved("s1", "CLO2")]).facts;
        (index, facts)
    }

    #[test]
    fn counting_and_weighted_diverge() {
        let (index, facts) = fixture();
        let plo = AggregateKey::plo("PLO1");
        let counting = ratio(&index, &facts, "s1", &plo, RollupFormula::Counting);
        let weighted = ratio(&index, &facts, "s1", &plo, RollupFormula::Weighted);
        assert!((counting - 0.5).abs() < 1e-12);
        assert!((weighted - 0.75).abs() < 1e-12);
    }

    #[test]
    fn empty_dependency_set_is_zero() {
        let (index, facts) = fixture();
        let empty = AggregateKey::plo("PLO0");
        for formula in [RollupFormula::Counting, RollupFormula::Weighted] {
            assert_eq!(ratio(&index, &facts, "s1", &empty, formula), 0.0);
            assert_eq!(ratio(&index, &facts, "nobody", &empty, formula), 0.0);
        }
    }

    #[test]
    fn table_is_total_and_bounded() {
        let (index, facts) = fixture();
        let students = vec![Student::new("s1", "A"), Student::new("s2", "B")];
        let outcomes = vec![
            AggregateKey::plo("PLO0"),
            AggregateKey::plo("PLO1"),
            AggregateKey::plo("unknown"),
        ];
        let table = rollup(&index, &facts, &students, &outcomes, RollupFormula::Counting);
        assert_eq!(table.rows().len(), 2);
        for row in table.rows() {
            assert_eq!(row.len(), 3);
            assert!(row.iter().all(|r| (0.0..=1.0).contains(r)));
        }
        assert_eq!(table.ratio("s1", &AggregateKey::plo("PLO1")), Some(0.5));
        assert_eq!(table.ratio("s2", &AggregateKey::plo("PLO1")), Some(0.0));
        assert_eq!(table.ratio("s3", &AggregateKey::plo("PLO1")), None);
        assert_eq!(table.formula(), RollupFormula::Counting);
    }

    #[test]
    fn progress_reports_tallies() {
        let (index, facts) = fixture();
        let view = progress(&index, &facts, "s1", AggregateKind::Plo, RollupFormula::Weighted);
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].outcome, AggregateKey::plo("PLO0"));
        assert_eq!(view[0].ratio, 0.0);
        let plo1 = &view[1];
        assert_eq!(plo1.tally.achieved, 1);
        assert_eq!(plo1.tally.total, 2);
        assert_eq!(plo1.tally.achieved_weight, 3);
        assert_eq!(plo1.tally.total_weight, 4);
        assert!((plo1.ratio - 0.75).abs() < 1e-12);
    }
}
