mod export;
pub mod views;

pub use export::{write_area_csv, write_unit_csv};

use super::aggregation::{AreaAggregator, AreaSummary};
use super::composite::QualityLevel;
use super::domain::{Category, CategoryId, OrgUnit};
use super::evaluation::CategoryEvaluator;
use std::collections::HashMap;
use views::{
    AreaCategoryView, AreaLevel, AreaReportRow, LevelDistribution, LevelShare,
    UnitAssessmentState, UnitReportRow,
};

/// Rounds to two decimals for presentation. Stored values stay unrounded.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn area_row(
    level: AreaLevel,
    code: Option<&str>,
    name: &str,
    summary: &AreaSummary,
    categories: &[Category],
) -> AreaReportRow {
    let by_id: HashMap<&CategoryId, &Category> = categories
        .iter()
        .map(|category| (&category.id, category))
        .collect();

    let category_views = summary
        .categories
        .iter()
        .map(|result| {
            let category = by_id.get(&result.category_id);
            AreaCategoryView {
                category_id: result.category_id.clone(),
                code: category
                    .map(|category| category.code.clone())
                    .unwrap_or_else(|| result.category_id.0.clone()),
                name_th: category
                    .map(|category| category.name_th.clone())
                    .unwrap_or_default(),
                name_en: category
                    .map(|category| category.name_en.clone())
                    .unwrap_or_default(),
                passed_units: result.passed_units,
                total_units: result.total_units,
                pass_percentage: result.pass_percentage.map(round2),
            }
        })
        .collect();

    AreaReportRow {
        level,
        level_label: level.label(),
        code: code.map(str::to_string),
        name: name.to_string(),
        total_units: summary.total_units,
        units_assessed: summary.units_assessed,
        not_assessed: summary.not_assessed(),
        units_passed_all: summary.units_passed_all,
        assessed_percentage: summary.assessed_percentage().map(round2),
        passed_all_percentage: summary.passed_all_percentage().map(round2),
        categories: category_views,
    }
}

pub fn unit_row(
    unit: &OrgUnit,
    aggregator: &AreaAggregator<'_>,
    evaluator: &CategoryEvaluator,
) -> UnitReportRow {
    let categories = aggregator.categories();
    let total_categories = categories.len();

    let base = UnitReportRow {
        unit_id: unit.id.clone(),
        kind: unit.id.kind,
        kind_label: unit.id.kind.label(),
        name: unit.name.clone(),
        province_code: unit.province_code.clone(),
        state: UnitAssessmentState::NotAssessed,
        state_label: UnitAssessmentState::NotAssessed.label(),
        assessment_id: None,
        fiscal_year: None,
        passed_count: 0,
        total_categories,
        percentage: 0.0,
        passed_all: false,
    };

    let Some(assessment) = aggregator.latest_for(&unit.id) else {
        return base;
    };

    let items = aggregator.items_for(&assessment.id);
    let evaluation = evaluator.evaluate_unit(categories, items);

    UnitReportRow {
        state: UnitAssessmentState::Assessed,
        state_label: UnitAssessmentState::Assessed.label(),
        assessment_id: Some(assessment.id.clone()),
        fiscal_year: Some(assessment.fiscal_year),
        passed_count: evaluation.passed_count,
        percentage: round2(evaluation.percentage),
        passed_all: evaluator.passes_all(categories, items),
        ..base
    }
}

/// Tallies units per quality level; `None` entries are not-assessed units.
pub fn level_distribution<I>(levels: I) -> LevelDistribution
where
    I: IntoIterator<Item = Option<QualityLevel>>,
{
    let mut counts: HashMap<QualityLevel, usize> = HashMap::new();
    let mut not_assessed = 0;
    let mut total_units = 0;

    for level in levels {
        total_units += 1;
        match level {
            Some(level) => *counts.entry(level).or_default() += 1,
            None => not_assessed += 1,
        }
    }

    let levels = QualityLevel::ordered()
        .into_iter()
        .map(|level| {
            let units = counts.get(&level).copied().unwrap_or(0);
            LevelShare {
                level,
                label: level.label(),
                label_th: level.label_th(),
                units,
                percentage: super::aggregation::percentage_of(units, total_units).map(round2),
            }
        })
        .collect();

    LevelDistribution {
        total_units,
        not_assessed,
        levels,
    }
}
