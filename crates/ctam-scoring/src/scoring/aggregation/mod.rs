//! Roll-up of per-unit assessment outcomes to province, region and country.

mod hierarchy;

pub use hierarchy::{
    roll_up_country, roll_up_region, CountryReport, OrganizationDirectory, ProvinceReport,
    ProvinceUnits, RegionReport, RegionUnits,
};

use super::domain::{Assessment, AssessmentId, AssessmentItem, Category, CategoryId, ItemStatus, UnitId};
use super::evaluation::{self, AreaCategoryResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Latest approved assessment per unit, borrowed from the caller's records.
pub type LatestByUnit<'a> = HashMap<UnitId, &'a Assessment>;

/// Selects each unit's latest approved assessment.
///
/// PRECONDITION: `assessments` must be ordered by ascending creation time.
/// Nothing is sorted here: every approved record overwrites the previous
/// selection for its unit, so the last approved record in slice order wins.
/// Unsorted input silently selects the wrong assessment.
pub fn latest_approved_by_unit<'a, F>(assessments: &'a [Assessment], is_approved: F) -> LatestByUnit<'a>
where
    F: Fn(&str) -> bool,
{
    select_latest(assessments.iter(), is_approved)
}

/// Same as [`latest_approved_by_unit`], restricted to one fiscal year first.
///
/// The year filter runs before approval and latest selection, so each year's
/// view picks its own latest assessment. `None` keeps every year.
pub fn latest_approved_for_year<'a, F>(
    assessments: &'a [Assessment],
    fiscal_year: Option<i32>,
    is_approved: F,
) -> LatestByUnit<'a>
where
    F: Fn(&str) -> bool,
{
    select_latest(
        assessments
            .iter()
            .filter(|assessment| fiscal_year.map_or(true, |year| assessment.fiscal_year == year)),
        is_approved,
    )
}

fn select_latest<'a, I, F>(assessments: I, is_approved: F) -> LatestByUnit<'a>
where
    I: Iterator<Item = &'a Assessment>,
    F: Fn(&str) -> bool,
{
    let mut latest = HashMap::new();
    for assessment in assessments.filter(|assessment| is_approved(&assessment.status)) {
        latest.insert(assessment.unit.clone(), assessment);
    }
    latest
}

/// Items grouped by the assessment they belong to.
#[derive(Debug, Clone, Default)]
pub struct ItemIndex {
    by_assessment: HashMap<AssessmentId, Vec<AssessmentItem>>,
}

impl ItemIndex {
    pub fn items_for(&self, assessment_id: &AssessmentId) -> &[AssessmentItem] {
        self.by_assessment
            .get(assessment_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn assessment_count(&self) -> usize {
        self.by_assessment.len()
    }
}

impl FromIterator<AssessmentItem> for ItemIndex {
    fn from_iter<T: IntoIterator<Item = AssessmentItem>>(iter: T) -> Self {
        let mut by_assessment: HashMap<AssessmentId, Vec<AssessmentItem>> = HashMap::new();
        for item in iter {
            by_assessment
                .entry(item.assessment_id.clone())
                .or_default()
                .push(item);
        }
        Self { by_assessment }
    }
}

/// Counts and per-category pass rates for a set of units.
///
/// Units without an approved assessment stay in `total_units` and in every
/// percentage denominator; they are the "not yet assessed" bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSummary {
    pub total_units: usize,
    pub units_assessed: usize,
    pub units_passed_all: usize,
    pub categories: Vec<AreaCategoryResult>,
}

impl AreaSummary {
    pub fn not_assessed(&self) -> usize {
        self.total_units.saturating_sub(self.units_assessed)
    }

    pub fn assessed_percentage(&self) -> Option<f64> {
        percentage_of(self.units_assessed, self.total_units)
    }

    pub fn passed_all_percentage(&self) -> Option<f64> {
        percentage_of(self.units_passed_all, self.total_units)
    }
}

pub(crate) fn percentage_of(count: usize, total: usize) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(count as f64 / total as f64 * 100.0)
    }
}

/// Aggregates the latest approved assessments of `unit_ids`.
///
/// Duplicate ids in `unit_ids` are counted once. A unit passes all categories
/// only when each configured category has a passing item; with no categories
/// configured no unit counts as passing all.
pub fn aggregate_units_to_area(
    unit_ids: &[UnitId],
    categories: &[Category],
    items: &ItemIndex,
    latest: &LatestByUnit<'_>,
) -> AreaSummary {
    let ordered = evaluation::ordered(categories);
    let mut seen = HashSet::new();
    let scope: Vec<&UnitId> = unit_ids.iter().filter(|id| seen.insert(*id)).collect();

    let mut passed_per_category = vec![0usize; ordered.len()];
    let mut units_assessed = 0;
    let mut units_passed_all = 0;

    for unit in &scope {
        let Some(assessment) = latest.get(*unit) else {
            continue;
        };
        units_assessed += 1;

        let passed: HashSet<&CategoryId> = items
            .items_for(&assessment.id)
            .iter()
            .filter(|item| item.status == ItemStatus::Pass)
            .map(|item| &item.category_id)
            .collect();

        let mut all_passed = !ordered.is_empty();
        for (slot, category) in ordered.iter().enumerate() {
            if passed.contains(&category.id) {
                passed_per_category[slot] += 1;
            } else {
                all_passed = false;
            }
        }

        if all_passed {
            units_passed_all += 1;
        }
    }

    let total_units = scope.len();
    debug!(
        total_units,
        units_assessed, units_passed_all, "aggregated area"
    );

    let categories = ordered
        .iter()
        .zip(passed_per_category)
        .map(|(category, passed)| AreaCategoryResult::new(category.id.clone(), passed, total_units))
        .collect();

    AreaSummary {
        total_units,
        units_assessed,
        units_passed_all,
        categories,
    }
}

/// Binds the category list, item index and latest selection so area
/// summaries can be computed for any unit set.
pub struct AreaAggregator<'a> {
    categories: &'a [Category],
    items: &'a ItemIndex,
    latest: LatestByUnit<'a>,
}

impl<'a> AreaAggregator<'a> {
    pub fn new(categories: &'a [Category], items: &'a ItemIndex, latest: LatestByUnit<'a>) -> Self {
        Self {
            categories,
            items,
            latest,
        }
    }

    pub fn aggregate(&self, unit_ids: &[UnitId]) -> AreaSummary {
        aggregate_units_to_area(unit_ids, self.categories, self.items, &self.latest)
    }

    pub fn latest_for(&self, unit: &UnitId) -> Option<&'a Assessment> {
        self.latest.get(unit).copied()
    }

    pub fn items_for(&self, assessment_id: &AssessmentId) -> &'a [AssessmentItem] {
        self.items.items_for(assessment_id)
    }

    pub fn categories(&self) -> &'a [Category] {
        self.categories
    }

    pub fn roll_up_region(&self, region: &RegionUnits) -> RegionReport {
        roll_up_region(region, |units: &[UnitId]| self.aggregate(units))
    }

    pub fn roll_up_country(&self, regions: &[RegionUnits]) -> CountryReport {
        roll_up_country(regions, |units: &[UnitId]| self.aggregate(units))
    }
}
