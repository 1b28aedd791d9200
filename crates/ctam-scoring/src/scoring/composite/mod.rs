mod levels;

pub use levels::{QualityBand, QualityLevel, QualityLevelTable, QualityTableError, ScoreScale};

use super::domain::{ImpactScore, QualitativeScore};
use super::evaluation::{UnitEvaluation, QUANTITATIVE_MAX};
use serde::{Deserialize, Serialize};

/// Raw qualitative and impact scores are on 0–15; the composite uses 0–1.5.
const RAW_TO_COMPOSITE: f64 = 10.0;

/// Impact contribution when no impact record exists.
pub const IMPACT_DEFAULT: f64 = 1.5;

pub fn quantitative_component(passed_count: usize, total_categories: usize) -> f64 {
    if total_categories == 0 {
        return 0.0;
    }
    passed_count as f64 / total_categories as f64 * QUANTITATIVE_MAX
}

/// Zero credit when the assessment has no qualitative record.
pub fn qualitative_component(score: Option<&QualitativeScore>) -> f64 {
    score
        .map(|score| score.effective_total() / RAW_TO_COMPOSITE)
        .unwrap_or(0.0)
}

/// Full credit when the assessment has no impact record.
pub fn impact_component(score: Option<&ImpactScore>) -> f64 {
    score
        .map(|score| score.effective_total() / RAW_TO_COMPOSITE)
        .unwrap_or(IMPACT_DEFAULT)
}

pub fn total_score(quantitative: f64, qualitative: f64, impact: f64) -> f64 {
    quantitative + qualitative + impact
}

/// Bands a 0-10 composite total on the standard table.
///
/// The written bands are closed ranges on a one-decimal grid, but each band
/// is resolved as `[min, next.min)`, so totals between two written ranges
/// fall into the lower band: 7.05 is Fair, not unbanded. Only scores outside
/// 0-10 fall back to Critical.
pub fn quality_level(total: f64) -> QualityLevel {
    QualityLevelTable::standard().level(total)
}

/// Same resolution as [`quality_level`] on the 0-100 table; 70.59% is Fair.
pub fn quality_level_from_percentage(percentage: f64) -> QualityLevel {
    QualityLevelTable::percentage().level(percentage)
}

/// Combines the weighted sub-scores and resolves the quality band.
#[derive(Debug, Clone)]
pub struct CompositeScoreCalculator {
    table: QualityLevelTable,
    percentage_table: QualityLevelTable,
}

impl CompositeScoreCalculator {
    pub fn new(table: QualityLevelTable) -> Self {
        Self {
            table,
            percentage_table: QualityLevelTable::percentage(),
        }
    }

    pub fn table(&self) -> &QualityLevelTable {
        &self.table
    }

    pub fn score(
        &self,
        evaluation: &UnitEvaluation,
        qualitative: Option<&QualitativeScore>,
        impact: Option<&ImpactScore>,
    ) -> CompositeScore {
        let quantitative =
            quantitative_component(evaluation.passed_count, evaluation.total_categories);
        let qualitative = qualitative_component(qualitative);
        let impact = impact_component(impact);
        let total = total_score(quantitative, qualitative, impact);
        let band = self.table.resolve(total);

        CompositeScore {
            quantitative,
            qualitative,
            impact,
            total,
            level: band.level,
            table_version: self.table.version.clone(),
        }
    }

    pub fn level(&self, total: f64) -> &QualityBand {
        self.table.resolve(total)
    }

    /// Band used by quantitative-only views.
    pub fn percentage_level(&self, percentage: f64) -> &QualityBand {
        self.percentage_table.resolve(percentage)
    }
}

impl Default for CompositeScoreCalculator {
    fn default() -> Self {
        Self::new(QualityLevelTable::standard())
    }
}

/// Final 0–10 assessment score. Values are unrounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub quantitative: f64,
    pub qualitative: f64,
    pub impact: f64,
    pub total: f64,
    pub level: QualityLevel,
    pub table_version: String,
}
