//! End-to-end tests for the rollup engine.
//!
//! These tests exercise the full pipeline from raw achievement rows through
//! rollup, matrix building, clustering and export, validating that the
//! resolver, link graph and clustering engine work together.

use chrono::{DateTime, TimeZone, Utc};

use competency_rollup::achievement::{AchievementRecord, AchievementStatus};
use competency_rollup::cluster::{ClusterOutcome, SkipReason};
use competency_rollup::config::AnalyticsConfig;
use competency_rollup::engine::Engine;
use competency_rollup::export::{HeatmapExport, ProgressExport};
use competency_rollup::graph::LinkEdge;
use competency_rollup::outcome::{AggregateKind, Granularity, Student, WeightLevel};
use competency_rollup::rollup::RollupFormula;
use competency_rollup::snapshot::Snapshot;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn level(l: u8) -> WeightLevel {
    WeightLevel::new(l).unwrap()
}

fn roster(n: usize) -> Vec<Student> {
    (1..=n)
        .map(|i| Student::new(i.to_string(), format!("SV{i:03}")))
        .collect()
}

/// Records for every CLO of CS1 for one student, all with the same status.
fn all_clos(student: &str, status: AchievementStatus) -> Vec<AchievementRecord> {
    (1..=3)
        .map(|c| AchievementRecord::new(student, "CS1", format!("CLO{c}"), status, at(100)))
        .collect()
}

/// `n` students, CS1:CLO1..3 all linked to PLO1; `achiever(i)` decides who achieved.
fn framework(n: usize, achiever: impl Fn(usize) -> bool) -> Snapshot {
    let students = roster(n);
    let records = students
        .iter()
        .enumerate()
        .flat_map(|(i, s)| {
            let status = if achiever(i) {
                AchievementStatus::Achieved
            } else {
                AchievementStatus::NotYet
            };
            all_clos(&s.id, status)
        })
        .collect();
    Snapshot {
        students,
        records,
        plo_clo: (1..=3)
            .map(|c| LinkEdge::new("PLO1", "CS1", format!("CLO{c}"), level(c as u8)))
            .collect(),
        ..Default::default()
    }
}

#[test]
fn eight_students_split_into_two_clean_clusters() {
    let snapshot = framework(8, |i| i < 4);
    let engine = Engine::new(&AnalyticsConfig::default()).unwrap();
    let report = engine.heatmap(&snapshot, Granularity::Plo).unwrap();

    let ratios: Vec<f64> = report.matrix.rows().iter().map(|r| r[0]).collect();
    assert_eq!(ratios, vec![1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);

    let assignment = report.clustering.assignment().expect("8 rows are clustered");
    assert_eq!(assignment.k, 2);
    assert_eq!(assignment.labels, vec![0, 0, 0, 0, 1, 1, 1, 1]);
    assert!((assignment.silhouette - 1.0).abs() < 1e-9);
    assert_eq!(report.row_order, (0..8).collect::<Vec<_>>());

    assert_eq!(report.summaries.len(), 2);
    assert_eq!(report.summaries[0].mean_profile, vec![1.0]);
    assert_eq!(report.summaries[1].mean_profile, vec![0.0]);
}

#[test]
fn clo_granularity_clusters_the_same_groups() {
    let snapshot = framework(8, |i| i < 4);
    let report = Engine::default()
        .heatmap(&snapshot, Granularity::Clo)
        .unwrap();
    assert_eq!(report.matrix.n_cols(), 3);
    assert!(
        report
            .matrix
            .rows()
            .iter()
            .flatten()
            .all(|&v| v == 0.0 || v == 1.0)
    );
    let assignment = report.clustering.assignment().unwrap();
    assert_eq!(assignment.labels, vec![0, 0, 0, 0, 1, 1, 1, 1]);
}

#[test]
fn interleaved_roster_is_regrouped_for_display() {
    // Achievers on even rows: both seeds start on achievers, Lloyd's
    // iterations still pull the groups apart.
    let snapshot = framework(8, |i| i % 2 == 0);
    let report = Engine::default()
        .heatmap(&snapshot, Granularity::Plo)
        .unwrap();
    let assignment = report.clustering.assignment().unwrap();
    assert!((assignment.silhouette - 1.0).abs() < 1e-9);
    assert_eq!(report.row_order, vec![1, 3, 5, 7, 0, 2, 4, 6]);

    let export = HeatmapExport::from_report(&report).unwrap();
    assert_eq!(export.students[0], "SV002");
    assert_eq!(export.student_ids[4], "1");
    assert_eq!(export.values[0], vec![0.0]);
    assert_eq!(export.values[7], vec![1.0]);
    assert_eq!(export.cluster_labels, Some(vec![0, 0, 0, 0, 1, 1, 1, 1]));
    assert_eq!(export.k, Some(2));
    assert_eq!(export.formula.as_deref(), Some("counting"));
    assert_eq!(export.clusters[1].students, vec!["SV001", "SV003", "SV005", "SV007"]);
}

#[test]
fn plo_without_links_rolls_up_to_zero() {
    let mut snapshot = framework(8, |_| true);
    snapshot.plos = vec!["PLO1".into(), "PLO9".into()];
    let report = Engine::default()
        .heatmap(&snapshot, Granularity::Plo)
        .unwrap();
    assert_eq!(report.matrix.columns(), &["PLO1", "PLO9"]);
    assert!(report.matrix.rows().iter().all(|r| r[1] == 0.0));
    assert!(report.normalized.rows().iter().all(|r| r[1] == 0.0));
}

#[test]
fn later_not_yet_overrides_earlier_achieved() {
    let mut snapshot = framework(1, |_| false);
    snapshot.plo_clo.truncate(1);
    snapshot.records = vec![
        AchievementRecord::new("1", "CS1", "CLO1", AchievementStatus::NotYet, at(200)),
        AchievementRecord::new("1", "CS1", "CLO1", AchievementStatus::Achieved, at(100)),
    ];
    let report = Engine::default()
        .heatmap(&snapshot, Granularity::Clo)
        .unwrap();
    assert_eq!(report.matrix.value(0, 0), Some(0.0));
}

#[test]
fn guard_boundary_through_the_engine() {
    let engine = Engine::default();
    for (n, clustered) in [(5, false), (6, true), (300, true), (301, false)] {
        let snapshot = framework(n, |i| i % 3 == 0);
        let report = engine.heatmap(&snapshot, Granularity::Plo).unwrap();
        assert_eq!(report.clustering.is_clustered(), clustered, "n = {n}");
        if !clustered {
            assert_eq!(report.row_order, (0..n).collect::<Vec<_>>());
            assert!(matches!(
                report.clustering,
                ClusterOutcome::Skipped(SkipReason::RowCount { .. })
            ));
        }
    }
}

#[test]
fn identical_input_gives_identical_output() {
    let snapshot = framework(40, |i| (i * 7) % 5 < 2);
    let engine = Engine::default();
    let a = engine.heatmap(&snapshot, Granularity::Clo).unwrap();
    let b = engine.heatmap(&snapshot, Granularity::Clo).unwrap();
    assert_eq!(a.clustering, b.clustering);
    assert_eq!(
        HeatmapExport::from_report(&a).unwrap(),
        HeatmapExport::from_report(&b).unwrap()
    );
}

#[test]
fn selected_k_beats_or_ties_every_candidate() {
    // Mixed achievement patterns across three CLOs, 30 students.
    let students = roster(30);
    let records = students
        .iter()
        .enumerate()
        .flat_map(|(i, s)| {
            (1..=3).map(move |c| {
                let status = if (i + c) % (c + 1) == 0 {
                    AchievementStatus::Achieved
                } else {
                    AchievementStatus::NotYet
                };
                AchievementRecord::new(s.id.clone(), "CS1", format!("CLO{c}"), status, at(1))
            })
        })
        .collect();
    let snapshot = Snapshot {
        students,
        records,
        ..Default::default()
    };
    let report = Engine::default()
        .heatmap(&snapshot, Granularity::Clo)
        .unwrap();
    let a = report.clustering.assignment().unwrap();
    assert_eq!(
        a.candidates.iter().map(|c| c.k).collect::<Vec<_>>(),
        vec![2, 3, 4, 5]
    );
    for c in &a.candidates {
        assert!(a.silhouette >= c.silhouette);
        if c.silhouette == a.silhouette {
            assert!(a.k <= c.k);
        }
    }
    assert!(a.labels.iter().all(|&l| l < a.k));
}

#[test]
fn progress_view_uses_weighted_rollup() {
    // Student 1 achieved CLO3 only; PLO1 links CLO1 (L1), CLO2 (L2), CLO3 (L3).
    let mut snapshot = framework(2, |_| false);
    snapshot.records.push(AchievementRecord::new(
        "1",
        "CS1",
        "CLO3",
        AchievementStatus::Achieved,
        at(500),
    ));
    let engine = Engine::default();

    let weighted = engine
        .student_progress(&snapshot, "1", AggregateKind::Plo)
        .unwrap();
    assert_eq!(weighted.formula, RollupFormula::Weighted);
    assert!((weighted.outcomes[0].ratio - 0.5).abs() < 1e-12);

    let counting = engine
        .student_progress_with(&snapshot, "1", AggregateKind::Plo, RollupFormula::Counting)
        .unwrap();
    assert!((counting.outcomes[0].ratio - 1.0 / 3.0).abs() < 1e-12);

    let export = ProgressExport::from(&weighted);
    assert_eq!(export.student, "SV001");
    assert_eq!(export.outcomes[0].code, "PLO1");
    assert_eq!(export.outcomes[0].achieved_weight, 3);
    assert_eq!(export.outcomes[0].total_weight, 6);
}

#[test]
fn snapshot_json_drives_the_pipeline() {
    let json = r#"{
        "students": [
            {"id": "a", "code": "A"}, {"id": "b", "code": "B"}, {"id": "c", "code": "C"},
            {"id": "d", "code": "D"}, {"id": "e", "code": "E"}, {"id": "f", "code": "F"}
        ],
        "records": [
            {"student": "a", "course_code": "X", "clo_code": "1", "status": "achieved", "updated_at": "2024-01-01T00:00:00Z"},
            {"student": "b", "course_code": "X", "clo_code": "1", "status": "achieved", "updated_at": "2024-01-01T00:00:00Z"},
            {"student": "c", "course_code": "X", "clo_code": "1", "status": "achieved", "updated_at": "2024-01-01T00:00:00Z"},
            {"student": "", "course_code": "X", "clo_code": "1", "status": "achieved", "updated_at": "2024-01-01T00:00:00Z"}
        ],
        "pi_clo": [{"code": "PI1", "course_code": "X", "clo_code": "1", "weight": 2}]
    }"#;
    let snapshot = Snapshot::from_json_str(json).unwrap();
    let report = Engine::default()
        .heatmap(&snapshot, Granularity::Pi)
        .unwrap();
    assert_eq!(report.dropped_records, 1);
    let a = report.clustering.assignment().unwrap();
    assert_eq!(a.labels, vec![0, 0, 0, 1, 1, 1]);

    let export = HeatmapExport::from_report(&report).unwrap();
    let text = serde_json::to_string(&export).unwrap();
    let back: HeatmapExport = serde_json::from_str(&text).unwrap();
    assert_eq!(back.granularity, "PI");
    assert_eq!(back.students, vec!["A", "B", "C", "D", "E", "F"]);
}

#[test]
fn padded_roster_id_still_finds_its_facts() {
    let json = r#"{
        "students": [{"id": "a "}],
        "records": [
            {"student": "a ", "course_code": "X", "clo_code": "1", "status": "achieved", "updated_at": "2024-01-01T00:00:00Z"}
        ],
        "plo_clo": [{"code": "PLO1", "course_code": "X", "clo_code": "1", "weight": 1}]
    }"#;
    let snapshot = Snapshot::from_json_str(json).unwrap();
    let engine = Engine::default();

    let report = engine.heatmap(&snapshot, Granularity::Plo).unwrap();
    assert_eq!(report.matrix.rows(), &[vec![1.0]]);

    let progress = engine
        .student_progress(&snapshot, "a", AggregateKind::Plo)
        .unwrap();
    assert_eq!(progress.outcomes[0].ratio, 1.0);
}

#[test]
fn blank_status_row_is_dropped_not_fatal() {
    let json = r#"{
        "students": [{"id": "a"}],
        "records": [
            {"student": "a", "course_code": "X", "clo_code": "1", "status": "achieved", "updated_at": "2024-01-01T00:00:00Z"},
            {"student": "a", "course_code": "X", "clo_code": "1", "status": "", "updated_at": ""}
        ],
        "plo_clo": [{"code": "PLO1", "course_code": "X", "clo_code": "1", "weight": 2}]
    }"#;
    let snapshot = Snapshot::from_json_str(json).unwrap();
    let report = Engine::default()
        .heatmap(&snapshot, Granularity::Plo)
        .unwrap();
    assert_eq!(report.dropped_records, 1);
    assert_eq!(report.matrix.rows(), &[vec![1.0]]);
    assert_eq!(HeatmapExport::from_report(&report).unwrap().dropped_records, 1);
}

#[test]
fn export_codes_come_from_the_report_roster() {
    let mut snapshot = framework(6, |i| i < 3);
    snapshot.students[0].code = String::new();
    let report = Engine::default()
        .heatmap(&snapshot, Granularity::Plo)
        .unwrap();
    assert_eq!(report.students, snapshot.students);
    let export = HeatmapExport::from_report(&report).unwrap();
    assert_eq!(export.students, vec!["1", "SV002", "SV003", "SV004", "SV005", "SV006"]);
}
