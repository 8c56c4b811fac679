//! Achievement facts: raw CLO-level records and their resolved form.
//!
//! Raw [`AchievementRecord`]s arrive from bulk uploads and may repeat the same
//! (student, course, CLO) triple many times. [`resolve`] collapses them into
//! [`AchievementFacts`], one authoritative status per pair.

pub mod resolve;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::outcome::CloKey;

pub use resolve::{AchievementFacts, ResolveOutcome, resolve};

/// Binary CLO-level achievement status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementStatus {
    Achieved,
    NotYet,
}

impl AchievementStatus {
    pub fn is_achieved(self) -> bool {
        matches!(self, AchievementStatus::Achieved)
    }
}

impl std::str::FromStr for AchievementStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "achieved" => Ok(AchievementStatus::Achieved),
            "not_yet" => Ok(AchievementStatus::NotYet),
            other => Err(format!("unknown achievement status: {other:?}")),
        }
    }
}

impl std::fmt::Display for AchievementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AchievementStatus::Achieved => write!(f, "achieved"),
            AchievementStatus::NotYet => write!(f, "not_yet"),
        }
    }
}

/// A raw achievement row as uploaded.
///
/// Every field defaults so that partial rows still deserialize. A blank or
/// unrecognised status or timestamp reads as `None`; the resolver drops such
/// rows instead of failing the whole snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementRecord {
    #[serde(default)]
    pub student: String,
    #[serde(default)]
    pub course_code: String,
    #[serde(default)]
    pub clo_code: String,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<AchievementStatus>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<AchievementStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }))
}

impl AchievementRecord {
    pub fn new(
        student: impl Into<String>,
        course_code: impl Into<String>,
        clo_code: impl Into<String>,
        status: AchievementStatus,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            student: student.into(),
            course_code: course_code.into(),
            clo_code: clo_code.into(),
            status: Some(status),
            updated_at: Some(updated_at),
        }
    }

    /// Trimmed (student, CLO key) pair, or `None` when any identifier is blank.
    pub fn key(&self) -> Option<(String, CloKey)> {
        let student = self.student.trim();
        let course = self.course_code.trim();
        let clo = self.clo_code.trim();
        if student.is_empty() || course.is_empty() || clo.is_empty() {
            return None;
        }
        Some((student.to_string(), CloKey::new(course, clo)))
    }

    /// Status and timestamp, or `None` when either is missing or unreadable.
    pub fn fact(&self) -> Option<AchievementFact> {
        Some(AchievementFact {
            status: self.status?,
            updated_at: self.updated_at?,
        })
    }
}

/// The resolved status of one (student, CLO) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementFact {
    pub status: AchievementStatus,
    /// Timestamp of the record this fact was taken from.
    pub updated_at: DateTime<Utc>,
}
