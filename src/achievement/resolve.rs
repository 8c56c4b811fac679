//! Last-write-wins resolution of raw achievement records.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use super::{AchievementFact, AchievementRecord, AchievementStatus};
use crate::outcome::CloKey;

/// Resolved achievement facts keyed by student id, then CLO.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AchievementFacts {
    by_student: HashMap<String, HashMap<CloKey, AchievementFact>>,
    len: usize,
}

impl AchievementFacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolved fact for a pair, if any record for it survived resolution.
    ///
    /// Student ids are stored trimmed, so the lookup id is trimmed too.
    pub fn fact(&self, student: &str, clo: &CloKey) -> Option<&AchievementFact> {
        self.by_student.get(student.trim())?.get(clo)
    }

    pub fn status(&self, student: &str, clo: &CloKey) -> Option<AchievementStatus> {
        self.fact(student, clo).map(|f| f.status)
    }

    /// `true` only for a resolved `achieved` fact; missing facts count as not achieved.
    pub fn is_achieved(&self, student: &str, clo: &CloKey) -> bool {
        self.status(student, clo)
            .is_some_and(AchievementStatus::is_achieved)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CloKey, &AchievementFact)> {
        self.by_student.iter().flat_map(|(student, facts)| {
            facts
                .iter()
                .map(move |(clo, fact)| (student.as_str(), clo, fact))
        })
    }

    /// Every CLO carrying at least one fact, sorted.
    pub fn clo_keys(&self) -> Vec<CloKey> {
        let mut keys: Vec<CloKey> = self
            .by_student
            .values()
            .flat_map(|facts| facts.keys().cloned())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Offer a candidate fact; it replaces the incumbent unless the incumbent is strictly newer.
    fn offer(&mut self, student: String, clo: CloKey, candidate: AchievementFact) {
        match self.by_student.entry(student).or_default().entry(clo) {
            Entry::Occupied(mut slot) => {
                if candidate.updated_at >= slot.get().updated_at {
                    slot.insert(candidate);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(candidate);
                self.len += 1;
            }
        }
    }
}

/// Result of a resolution pass.
#[derive(Debug, Clone, Default)]
pub struct ResolveOutcome {
    pub facts: AchievementFacts,
    /// Rows skipped for a missing identifier, status or timestamp.
    pub dropped: usize,
}

/// Collapse raw records into one fact per (student, CLO).
///
/// The record with the latest `updated_at` wins. On equal timestamps the
/// record seen later in input order wins. Rows with a blank identifier or a
/// missing status or timestamp are skipped and counted, never an error.
pub fn resolve<'a, I>(records: I) -> ResolveOutcome
where
    I: IntoIterator<Item = &'a AchievementRecord>,
{
    let mut outcome = ResolveOutcome::default();
    let mut seen = 0usize;

    for record in records {
        seen += 1;
        let (Some((student, clo)), Some(fact)) = (record.key(), record.fact()) else {
            outcome.dropped += 1;
            continue;
        };
        outcome.facts.offer(student, clo, fact);
    }

    if outcome.dropped > 0 {
        tracing::debug!(
            dropped = outcome.dropped,
            seen,
            "skipped malformed achievement rows"
        );
    }
    tracing::debug!(facts = outcome.facts.len(), seen, "resolved achievement facts");
    outcome
}
