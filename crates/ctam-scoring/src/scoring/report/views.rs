use crate::scoring::composite::QualityLevel;
use crate::scoring::domain::{AssessmentId, CategoryId, UnitId, UnitKind};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaLevel {
    Country,
    Region,
    Province,
}

impl AreaLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Country => "Country",
            Self::Region => "Region",
            Self::Province => "Province",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AreaCategoryView {
    pub category_id: CategoryId,
    pub code: String,
    pub name_th: String,
    pub name_en: String,
    pub passed_units: usize,
    pub total_units: usize,
    pub pass_percentage: Option<f64>,
}

/// One line of a drill-down table, rounded for display.
#[derive(Debug, Clone, Serialize)]
pub struct AreaReportRow {
    pub level: AreaLevel,
    pub level_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub name: String,
    pub total_units: usize,
    pub units_assessed: usize,
    pub not_assessed: usize,
    pub units_passed_all: usize,
    pub assessed_percentage: Option<f64>,
    pub passed_all_percentage: Option<f64>,
    pub categories: Vec<AreaCategoryView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitAssessmentState {
    NotAssessed,
    Assessed,
}

impl UnitAssessmentState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotAssessed => "Not Assessed",
            Self::Assessed => "Assessed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitReportRow {
    pub unit_id: UnitId,
    pub kind: UnitKind,
    pub kind_label: &'static str,
    pub name: String,
    pub province_code: String,
    pub state: UnitAssessmentState,
    pub state_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_id: Option<AssessmentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiscal_year: Option<i32>,
    pub passed_count: usize,
    pub total_categories: usize,
    pub percentage: f64,
    pub passed_all: bool,
}

/// An area row together with its children one level down.
#[derive(Debug, Clone, Serialize)]
pub struct AreaDrillDown {
    pub area: AreaReportRow,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AreaReportRow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<UnitReportRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelShare {
    pub level: QualityLevel,
    pub label: &'static str,
    pub label_th: &'static str,
    pub units: usize,
    pub percentage: Option<f64>,
}

/// Pie/donut data: units per quality level plus the not-assessed slice.
#[derive(Debug, Clone, Serialize)]
pub struct LevelDistribution {
    pub total_units: usize,
    pub not_assessed: usize,
    pub levels: Vec<LevelShare>,
}
