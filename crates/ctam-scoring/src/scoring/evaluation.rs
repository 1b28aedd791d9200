use super::domain::{AssessmentItem, Category, CategoryId, ItemStatus, StatusScheme};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Maximum points the quantitative component contributes to the 0–10 total.
pub const QUANTITATIVE_MAX: f64 = 7.0;

/// Stateless evaluator deciding which categories an assessment passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryEvaluator {
    scheme: StatusScheme,
}

impl CategoryEvaluator {
    pub fn new(scheme: StatusScheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> StatusScheme {
        self.scheme
    }

    /// Counts passed categories for one assessment's items.
    ///
    /// A category passes when any of its items passes; duplicate items never
    /// average a pass away. Items pointing at categories outside `categories`
    /// are ignored.
    pub fn evaluate_unit(&self, categories: &[Category], items: &[AssessmentItem]) -> UnitEvaluation {
        let mut passed = HashSet::new();
        let mut partial = HashSet::new();

        for item in items {
            match item.status {
                ItemStatus::Pass => {
                    passed.insert(&item.category_id);
                }
                ItemStatus::Partial if self.scheme.recognizes_partial() => {
                    partial.insert(&item.category_id);
                }
                _ => {}
            }
        }

        let mut passed_count = 0;
        let mut partial_count = 0;
        for category in categories {
            if passed.contains(&category.id) {
                passed_count += 1;
            } else if partial.contains(&category.id) {
                partial_count += 1;
            }
        }

        let total_categories = categories.len();
        let (percentage, partial_credit_percentage) = if total_categories > 0 {
            let total = total_categories as f64;
            let credit = passed_count as f64 + partial_count as f64 * self.scheme.partial_weight();
            (passed_count as f64 / total * 100.0, credit / total * 100.0)
        } else {
            (0.0, 0.0)
        };

        UnitEvaluation {
            passed_count,
            partial_count,
            total_categories,
            percentage,
            partial_credit_percentage,
            score_out_of_7: percentage / 100.0 * QUANTITATIVE_MAX,
        }
    }

    pub fn evaluate_category(
        &self,
        items: &[AssessmentItem],
        category_id: &CategoryId,
    ) -> UnitCategoryResult {
        let matching: Vec<&AssessmentItem> = items
            .iter()
            .filter(|item| &item.category_id == category_id)
            .collect();

        let passed = matching.iter().any(|item| item.status == ItemStatus::Pass);
        let average = if matching.is_empty() {
            None
        } else if passed {
            Some(1.0)
        } else {
            let sum: f64 = matching.iter().map(|item| item.weight(self.scheme)).sum();
            Some(sum / matching.len() as f64)
        };

        UnitCategoryResult {
            category_id: category_id.clone(),
            average,
            passed,
            item_count: matching.len(),
        }
    }

    /// Per-category results in category order.
    pub fn evaluate_categories(
        &self,
        categories: &[Category],
        items: &[AssessmentItem],
    ) -> Vec<UnitCategoryResult> {
        ordered(categories)
            .into_iter()
            .map(|category| self.evaluate_category(items, &category.id))
            .collect()
    }

    /// True when every configured category has a passing item.
    ///
    /// An empty category list never counts as passing everything.
    pub fn passes_all(&self, categories: &[Category], items: &[AssessmentItem]) -> bool {
        if categories.is_empty() {
            return false;
        }
        let evaluation = self.evaluate_unit(categories, items);
        evaluation.passed_count == evaluation.total_categories
    }
}

/// Categories sorted by their configured order number, then code.
pub fn ordered(categories: &[Category]) -> Vec<&Category> {
    let mut sorted: Vec<&Category> = categories.iter().collect();
    sorted.sort_by(|a, b| {
        a.order_number
            .cmp(&b.order_number)
            .then_with(|| a.code.cmp(&b.code))
    });
    sorted
}

/// Quantitative outcome for one assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitEvaluation {
    pub passed_count: usize,
    pub partial_count: usize,
    pub total_categories: usize,
    pub percentage: f64,
    pub partial_credit_percentage: f64,
    pub score_out_of_7: f64,
}

/// One category at single-assessment level. `average` is 1.0 when any item
/// passes, the mean item score otherwise, and `None` without items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitCategoryResult {
    pub category_id: CategoryId,
    pub average: Option<f64>,
    pub passed: bool,
    pub item_count: usize,
}

/// One category across many units. `pass_percentage` is `None` for an empty
/// scope so "no data" stays distinct from zero percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaCategoryResult {
    pub category_id: CategoryId,
    pub passed_units: usize,
    pub total_units: usize,
    pub pass_percentage: Option<f64>,
}

impl AreaCategoryResult {
    pub fn new(category_id: CategoryId, passed_units: usize, total_units: usize) -> Self {
        let pass_percentage = if total_units == 0 {
            None
        } else {
            Some(passed_units as f64 / total_units as f64 * 100.0)
        };

        Self {
            category_id,
            passed_units,
            total_units,
            pass_percentage,
        }
    }
}
