//! CTAM+ scoring: category pass evaluation, composite scores and quality
//! levels, and region/province/unit roll-ups.
//!
//! The evaluator, calculator and aggregator are pure functions over records the
//! caller has already loaded. The service and router wrap them around a
//! read-only [`AssessmentRepository`].

pub mod aggregation;
pub mod composite;
pub mod domain;
pub mod evaluation;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use aggregation::{
    aggregate_units_to_area, latest_approved_by_unit, latest_approved_for_year, AreaAggregator,
    AreaSummary, ItemIndex, LatestByUnit, OrganizationDirectory,
};
pub use composite::{
    impact_component, qualitative_component, quality_level, quality_level_from_percentage,
    quantitative_component, total_score, CompositeScore, CompositeScoreCalculator, QualityBand,
    QualityLevel, QualityLevelTable, QualityTableError, ScoreScale,
};
pub use domain::{
    ApprovalPolicy, Assessment, AssessmentId, AssessmentItem, Category, CategoryId, ImpactScore,
    ItemId, ItemStatus, OrgUnit, Province, QualitativeScore, Region, StatusScheme, UnitId,
    UnitKind,
};
pub use evaluation::{AreaCategoryResult, CategoryEvaluator, UnitCategoryResult, UnitEvaluation};
pub use repository::{AssessmentRepository, RepositoryError};
pub use router::scoring_router;
pub use service::{
    AssessmentScorecard, ReportScope, ScoringRules, ScoringService, ScoringServiceError,
};
