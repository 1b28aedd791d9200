use ctam_scoring::scoring::{AssessmentId, AssessmentRepository, ItemStatus, UnitId};
use ctam_scoring::snapshot::{SnapshotImportError, SnapshotImporter};
use std::path::PathBuf;

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/snapshot")
}

#[test]
fn loads_every_snapshot_file() {
    let snapshot = SnapshotImporter::from_dir(fixture_dir()).expect("snapshot loads");

    assert_eq!(snapshot.categories().len(), 17);
    assert_eq!(snapshot.categories()[16].name_en, "Personal Data Protection");
    assert_eq!(snapshot.directory().regions().len(), 2);
    assert_eq!(snapshot.directory().provinces().len(), 3);
    assert_eq!(snapshot.directory().units().len(), 5);
    assert_eq!(snapshot.assessments().len(), 5);
    assert_eq!(snapshot.items().len(), 85);

    let office = snapshot
        .directory()
        .unit(&UnitId::health_office("00050"))
        .expect("health office present");
    assert_eq!(office.province_code, "50");
}

#[test]
fn assessments_are_sorted_by_creation_time() {
    let snapshot = SnapshotImporter::from_dir(fixture_dir()).expect("snapshot loads");

    let ids: Vec<&str> = snapshot
        .assessments()
        .iter()
        .map(|assessment| assessment.id.0.as_str())
        .collect();
    assert_eq!(
        ids,
        ["asm-0401", "asm-0101", "asm-0201", "asm-0301", "asm-0102"]
    );
}

#[test]
fn repository_view_serves_scores_by_assessment() {
    let snapshot = SnapshotImporter::from_dir(fixture_dir()).expect("snapshot loads");
    let office = AssessmentId("asm-0201".to_string());

    let qualitative = snapshot
        .qualitative_score(&office)
        .expect("repository read")
        .expect("qualitative record");
    assert_eq!(qualitative.effective_total(), 12.0);

    let impact = snapshot
        .impact_score(&AssessmentId("asm-0401".to_string()))
        .expect("repository read")
        .expect("impact record");
    assert_eq!(impact.effective_total(), 7.0);

    let items = snapshot.items_for(&office).expect("repository read");
    assert_eq!(items.len(), 17);
    assert!(items.iter().all(|item| item.status == ItemStatus::Pass));

    let quantitative = snapshot
        .assessment(&AssessmentId("asm-0102".to_string()))
        .expect("repository read")
        .and_then(|assessment| assessment.quantitative_score);
    assert_eq!(quantitative, Some(70.59));
}

#[test]
fn optional_files_may_be_missing() {
    let dir = std::env::temp_dir().join(format!("ctam-snapshot-minimal-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    for file in ["categories.csv", "assessments.csv", "assessment_items.csv"] {
        std::fs::copy(fixture_dir().join(file), dir.join(file)).expect("copy fixture");
    }

    let snapshot = SnapshotImporter::from_dir(&dir).expect("minimal snapshot loads");
    assert!(snapshot.directory().units().is_empty());
    assert!(snapshot
        .impact_score(&AssessmentId("asm-0401".to_string()))
        .expect("repository read")
        .is_none());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn malformed_numbers_report_file_and_line() {
    let csv = "assessment_id,leadership_score,sustainable_score,total_score\n\
asm-1,7,5,\n\
asm-2,high,5,\n";

    let error = SnapshotImporter::qualitative_from_reader(csv.as_bytes())
        .expect_err("text score rejected");

    match &error {
        SnapshotImportError::InvalidRecord { file, line, message } => {
            assert_eq!(*file, "qualitative_scores.csv");
            assert_eq!(*line, 3);
            assert!(message.contains("leadership_score"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(error.to_string().starts_with("qualitative_scores.csv line 3"));
}
