use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::aggregation::{latest_approved_for_year, AreaAggregator, ItemIndex, OrganizationDirectory};
use super::composite::{CompositeScore, CompositeScoreCalculator, QualityLevel, QualityLevelTable};
use super::domain::{
    ApprovalPolicy, Assessment, AssessmentId, Category, StatusScheme, UnitId,
};
use super::evaluation::{self, CategoryEvaluator, UnitEvaluation};
use super::report::views::{AreaDrillDown, AreaLevel, LevelDistribution, UnitReportRow};
use super::report::{self, round2};
use super::repository::{AssessmentRepository, RepositoryError};

/// Approval vocabulary, status scheme and level table in force.
#[derive(Debug, Clone, Default)]
pub struct ScoringRules {
    pub approval: ApprovalPolicy,
    pub scheme: StatusScheme,
    pub quality_table: QualityLevelTable,
}

/// Fiscal-year filter and the unit set the caller is allowed to see.
///
/// Visibility is decided by the caller's role lookup; `None` means every unit.
#[derive(Debug, Clone, Default)]
pub struct ReportScope {
    pub fiscal_year: Option<i32>,
    pub visible_units: Option<HashSet<UnitId>>,
}

impl ReportScope {
    pub fn for_year(fiscal_year: i32) -> Self {
        Self {
            fiscal_year: Some(fiscal_year),
            visible_units: None,
        }
    }
}

/// Service composing the record store with the evaluator, calculator and
/// aggregator.
pub struct ScoringService<R> {
    repository: Arc<R>,
    evaluator: CategoryEvaluator,
    calculator: CompositeScoreCalculator,
    approval: ApprovalPolicy,
    default_fiscal_year: Option<i32>,
}

impl<R> ScoringService<R>
where
    R: AssessmentRepository + 'static,
{
    pub fn new(repository: Arc<R>, rules: ScoringRules) -> Self {
        Self {
            repository,
            evaluator: CategoryEvaluator::new(rules.scheme),
            calculator: CompositeScoreCalculator::new(rules.quality_table),
            approval: rules.approval,
            default_fiscal_year: None,
        }
    }

    pub fn with_default_fiscal_year(mut self, fiscal_year: Option<i32>) -> Self {
        self.default_fiscal_year = fiscal_year;
        self
    }

    /// Full score breakdown for a single assessment, approved or not.
    pub fn scorecard(
        &self,
        assessment_id: &AssessmentId,
    ) -> Result<AssessmentScorecard, ScoringServiceError> {
        let assessment = self
            .repository
            .assessment(assessment_id)?
            .ok_or_else(|| ScoringServiceError::AssessmentNotFound(assessment_id.clone()))?;
        let categories = self.repository.categories()?;
        let items = self.repository.items_for(assessment_id)?;
        let qualitative = self.repository.qualitative_score(assessment_id)?;
        let impact = self.repository.impact_score(assessment_id)?;
        let unit_name = self
            .repository
            .directory()?
            .unit(&assessment.unit)
            .map(|unit| unit.name.clone());

        let evaluation = self.evaluator.evaluate_unit(&categories, &items);
        let composite = self
            .calculator
            .score(&evaluation, qualitative.as_ref(), impact.as_ref());
        let band = self.calculator.level(composite.total);
        let quantitative_level = self.calculator.percentage_level(evaluation.percentage).level;

        let category_results = evaluation::ordered(&categories)
            .into_iter()
            .map(|category| {
                let result = self.evaluator.evaluate_category(&items, &category.id);
                ScorecardCategory {
                    code: category.code.clone(),
                    name_th: category.name_th.clone(),
                    name_en: category.name_en.clone(),
                    average: result.average,
                    passed: result.passed,
                    item_count: result.item_count,
                }
            })
            .collect();

        debug!(
            assessment = %assessment.id,
            total = composite.total,
            level = band.level.label(),
            "scored assessment"
        );

        Ok(AssessmentScorecard {
            approved: self.approval.is_approved(&assessment.status),
            unit_name,
            scheme: self.evaluator.scheme().label(),
            evaluation,
            categories: category_results,
            display: ScoreDisplay {
                percentage: round2(evaluation.percentage),
                quantitative: round2(composite.quantitative),
                qualitative: round2(composite.qualitative),
                impact: round2(composite.impact),
                total: round2(composite.total),
            },
            level_label: band.level.label(),
            level_label_th: band.level.label_th(),
            level_description: band.description.clone(),
            quantitative_level,
            composite,
            assessment,
        })
    }

    /// Country row with one child row per region.
    pub fn country_report(&self, scope: &ReportScope) -> Result<AreaDrillDown, ScoringServiceError> {
        let data = self.load(scope)?;
        let aggregator = data.aggregator(&self.approval);
        let tree = data.directory.region_tree();
        let country = aggregator.roll_up_country(&tree);

        let children = country
            .regions
            .iter()
            .map(|region| {
                report::area_row(
                    AreaLevel::Region,
                    Some(&region.region.code),
                    &region.region.name,
                    &region.summary,
                    &data.categories,
                )
            })
            .collect();

        info!(
            fiscal_year = ?data.fiscal_year,
            regions = tree.len(),
            units = country.summary.total_units,
            "built country report"
        );

        Ok(AreaDrillDown {
            area: report::area_row(
                AreaLevel::Country,
                None,
                "All regions",
                &country.summary,
                &data.categories,
            ),
            children,
            units: Vec::new(),
        })
    }

    /// Region row with one child row per province.
    pub fn region_report(
        &self,
        region_code: &str,
        scope: &ReportScope,
    ) -> Result<AreaDrillDown, ScoringServiceError> {
        let data = self.load(scope)?;
        let region = data
            .directory
            .region(region_code)
            .ok_or_else(|| ScoringServiceError::RegionNotFound(region_code.to_string()))?;
        let aggregator = data.aggregator(&self.approval);
        let rolled_up = aggregator.roll_up_region(&data.directory.region_units(region));

        let children = rolled_up
            .provinces
            .iter()
            .map(|province| {
                report::area_row(
                    AreaLevel::Province,
                    Some(&province.province.code),
                    &province.province.name,
                    &province.summary,
                    &data.categories,
                )
            })
            .collect();

        Ok(AreaDrillDown {
            area: report::area_row(
                AreaLevel::Region,
                Some(&region.code),
                &region.name,
                &rolled_up.summary,
                &data.categories,
            ),
            children,
            units: Vec::new(),
        })
    }

    /// Province row with every unit, including units not yet assessed.
    pub fn province_report(
        &self,
        province_code: &str,
        scope: &ReportScope,
    ) -> Result<AreaDrillDown, ScoringServiceError> {
        let data = self.load(scope)?;
        let province = data
            .directory
            .province(province_code)
            .ok_or_else(|| ScoringServiceError::ProvinceNotFound(province_code.to_string()))?;
        let aggregator = data.aggregator(&self.approval);
        let units = data.directory.province_units(province);
        let summary = aggregator.aggregate(&units.unit_ids);

        let unit_rows: Vec<UnitReportRow> = data
            .directory
            .units_in_province(&province.code)
            .into_iter()
            .map(|unit| report::unit_row(unit, &aggregator, &self.evaluator))
            .collect();

        Ok(AreaDrillDown {
            area: report::area_row(
                AreaLevel::Province,
                Some(&province.code),
                &province.name,
                &summary,
                &data.categories,
            ),
            children: Vec::new(),
            units: unit_rows,
        })
    }

    /// Units per composite quality level across the visible directory.
    ///
    /// Counts the same units as [`Self::country_report`]: units without a
    /// known province and region are left out of both.
    pub fn level_distribution(
        &self,
        scope: &ReportScope,
    ) -> Result<LevelDistribution, ScoringServiceError> {
        let data = self.load(scope)?;
        let aggregator = data.aggregator(&self.approval);
        let unit_ids: Vec<UnitId> = data
            .directory
            .region_tree()
            .iter()
            .flat_map(|region| region.unit_ids())
            .collect();

        let mut levels: Vec<Option<QualityLevel>> = Vec::with_capacity(unit_ids.len());
        for unit_id in &unit_ids {
            let level = match aggregator.latest_for(unit_id) {
                Some(assessment) => Some(self.level_for(&data.categories, &aggregator, assessment)?),
                None => None,
            };
            levels.push(level);
        }

        Ok(report::level_distribution(levels))
    }

    fn level_for(
        &self,
        categories: &[Category],
        aggregator: &AreaAggregator<'_>,
        assessment: &Assessment,
    ) -> Result<QualityLevel, ScoringServiceError> {
        let items = aggregator.items_for(&assessment.id);
        let evaluation = self.evaluator.evaluate_unit(categories, items);
        let qualitative = self.repository.qualitative_score(&assessment.id)?;
        let impact = self.repository.impact_score(&assessment.id)?;
        Ok(self
            .calculator
            .score(&evaluation, qualitative.as_ref(), impact.as_ref())
            .level)
    }

    fn load(&self, scope: &ReportScope) -> Result<ReportData, ScoringServiceError> {
        let mut directory = self.repository.directory()?;
        if let Some(visible) = &scope.visible_units {
            directory = directory.restrict_to(visible);
        }

        let data = ReportData {
            categories: self.repository.categories()?,
            directory,
            assessments: self.repository.assessments()?,
            items: self.repository.items()?.into_iter().collect(),
            fiscal_year: scope.fiscal_year.or(self.default_fiscal_year),
        };
        debug!(
            units = data.directory.units().len(),
            assessments = data.assessments.len(),
            assessments_with_items = data.items.assessment_count(),
            "loaded report data"
        );
        Ok(data)
    }
}

struct ReportData {
    categories: Vec<Category>,
    directory: OrganizationDirectory,
    assessments: Vec<Assessment>,
    items: ItemIndex,
    fiscal_year: Option<i32>,
}

impl ReportData {
    fn aggregator(&self, approval: &ApprovalPolicy) -> AreaAggregator<'_> {
        let latest = latest_approved_for_year(&self.assessments, self.fiscal_year, |status| {
            approval.is_approved(status)
        });
        AreaAggregator::new(&self.categories, &self.items, latest)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScorecardCategory {
    pub code: String,
    pub name_th: String,
    pub name_en: String,
    pub average: Option<f64>,
    pub passed: bool,
    pub item_count: usize,
}

/// Rounded figures for display next to the raw composite.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScoreDisplay {
    pub percentage: f64,
    pub quantitative: f64,
    pub qualitative: f64,
    pub impact: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentScorecard {
    pub assessment: Assessment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_name: Option<String>,
    pub approved: bool,
    pub scheme: &'static str,
    pub evaluation: UnitEvaluation,
    pub categories: Vec<ScorecardCategory>,
    pub composite: CompositeScore,
    pub display: ScoreDisplay,
    pub level_label: &'static str,
    pub level_label_th: &'static str,
    pub level_description: String,
    pub quantitative_level: QualityLevel,
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("assessment {0} not found")]
    AssessmentNotFound(AssessmentId),
    #[error("region {0} not found")]
    RegionNotFound(String),
    #[error("province {0} not found")]
    ProvinceNotFound(String),
}
