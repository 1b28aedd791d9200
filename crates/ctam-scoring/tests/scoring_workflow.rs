use std::sync::Arc;

use ctam_scoring::scoring::report::views::UnitAssessmentState;
use ctam_scoring::scoring::report::write_area_csv;
use ctam_scoring::scoring::{
    AssessmentId, QualityLevel, ReportScope, ScoringRules, ScoringService, UnitId,
};
use ctam_scoring::snapshot::{ScoringSnapshot, SnapshotImporter};
use std::path::PathBuf;

fn service() -> ScoringService<ScoringSnapshot> {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/snapshot");
    let snapshot = SnapshotImporter::from_dir(dir).expect("snapshot loads");
    ScoringService::new(Arc::new(snapshot), ScoringRules::default())
}

#[test]
fn twelve_passed_categories_score_fair() {
    let scorecard = service()
        .scorecard(&AssessmentId("asm-0102".to_string()))
        .expect("scorecard builds");

    assert_eq!(scorecard.evaluation.passed_count, 12);
    assert_eq!(scorecard.display.percentage, 70.59);
    assert_eq!(scorecard.display.quantitative, 4.94);
    assert_eq!(scorecard.display.qualitative, 0.0);
    assert_eq!(scorecard.display.impact, 1.5);
    assert_eq!(scorecard.display.total, 6.44);
    assert_eq!(scorecard.composite.level, QualityLevel::Fair);
}

#[test]
fn impact_deductions_lower_the_total() {
    let scorecard = service()
        .scorecard(&AssessmentId("asm-0401".to_string()))
        .expect("scorecard builds");

    assert_eq!(scorecard.display.impact, 0.7);
    assert_eq!(scorecard.display.total, 2.76);
    assert_eq!(scorecard.composite.level, QualityLevel::Critical);
}

#[test]
fn drill_down_from_country_to_units() {
    let service = service();
    let scope = ReportScope::for_year(2568);

    let country = service.country_report(&scope).expect("country report");
    assert_eq!(country.area.total_units, 5);
    assert_eq!(country.area.units_assessed, 2);
    assert_eq!(country.area.units_passed_all, 1);
    assert_eq!(country.area.passed_all_percentage, Some(20.0));

    let region = service.region_report("R01", &scope).expect("region report");
    assert_eq!(region.area.total_units, 4);
    assert_eq!(region.children.len(), 2);
    assert_eq!(region.children[1].name, "ลำพูน");
    assert_eq!(region.children[1].not_assessed, 1);

    let province = service.province_report("50", &scope).expect("province report");
    let states: Vec<(UnitId, UnitAssessmentState)> = province
        .units
        .iter()
        .map(|row| (row.unit_id.clone(), row.state))
        .collect();
    assert_eq!(
        states,
        [
            (UnitId::hospital("10713"), UnitAssessmentState::Assessed),
            (UnitId::hospital("11119"), UnitAssessmentState::NotAssessed),
            (UnitId::health_office("00050"), UnitAssessmentState::Assessed),
        ]
    );
    assert_eq!(
        province.units[0].assessment_id,
        Some(AssessmentId("asm-0102".to_string()))
    );
}

#[test]
fn previous_year_is_reported_separately() {
    let service = service();

    let previous = service
        .country_report(&ReportScope::for_year(2567))
        .expect("country report");
    assert_eq!(previous.area.units_assessed, 1);
    assert_eq!(previous.area.units_passed_all, 0);

    let distribution = service
        .level_distribution(&ReportScope::for_year(2567))
        .expect("distribution");
    assert_eq!(distribution.not_assessed, 4);
    let critical = distribution
        .levels
        .iter()
        .find(|share| share.level == QualityLevel::Critical)
        .expect("critical slice");
    assert_eq!(critical.units, 1);
    assert_eq!(critical.percentage, Some(20.0));
}

#[test]
fn region_rows_export_to_csv() {
    let country = service()
        .country_report(&ReportScope::for_year(2568))
        .expect("country report");

    let mut buffer = Vec::new();
    write_area_csv(&mut buffer, &country.children).expect("csv export");
    let output = String::from_utf8(buffer).expect("utf8 csv");

    let mut lines = output.lines();
    let header = lines.next().expect("header row");
    assert!(header.contains("CTAM-01_pct"));
    let first = lines.next().expect("first region");
    assert!(first.starts_with("Region,R01,"));
    assert_eq!(lines.count(), 1);
}
