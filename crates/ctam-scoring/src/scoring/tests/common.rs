use std::collections::HashMap;
use std::sync::Arc;

use axum::response::Response;
use axum::Router;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::scoring::aggregation::OrganizationDirectory;
use crate::scoring::domain::{
    Assessment, AssessmentId, AssessmentItem, Category, CategoryId, ImpactScore, ItemId,
    ItemStatus, OrgUnit, Province, QualitativeScore, Region, UnitId,
};
use crate::scoring::repository::{AssessmentRepository, RepositoryError};
use crate::scoring::service::{ScoringRules, ScoringService};
use crate::scoring::scoring_router;

pub(super) const CATEGORY_COUNT: usize = 17;
pub(super) const FISCAL_YEAR: i32 = 2568;

pub(super) fn category(index: usize) -> Category {
    Category {
        id: CategoryId(format!("c-{index:02}")),
        code: format!("CTAM-{index:02}"),
        order_number: index as u32,
        name_th: format!("หมวด {index}"),
        name_en: format!("Category {index}"),
    }
}

pub(super) fn categories() -> Vec<Category> {
    (1..=CATEGORY_COUNT).map(category).collect()
}

pub(super) fn item(assessment: &str, category: &CategoryId, status: ItemStatus) -> AssessmentItem {
    AssessmentItem {
        id: ItemId(format!("{assessment}-{category}-{}", status.label())),
        assessment_id: AssessmentId(assessment.to_string()),
        category_id: category.clone(),
        status,
        score: None,
    }
}

/// One item per category: the first `passed` categories pass, the rest fail.
pub(super) fn items_passing(
    assessment: &str,
    categories: &[Category],
    passed: usize,
) -> Vec<AssessmentItem> {
    categories
        .iter()
        .enumerate()
        .map(|(index, category)| {
            let status = if index < passed {
                ItemStatus::Pass
            } else {
                ItemStatus::Fail
            };
            item(assessment, &category.id, status)
        })
        .collect()
}

pub(super) fn day(year: i32, month: u32, date: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, date)
        .expect("valid date")
        .and_hms_opt(9, 0, 0)
        .expect("valid time")
}

pub(super) fn assessment(
    id: &str,
    unit: UnitId,
    status: &str,
    fiscal_year: i32,
    created_at: NaiveDateTime,
) -> Assessment {
    Assessment {
        id: AssessmentId(id.to_string()),
        unit,
        status: status.to_string(),
        fiscal_year,
        quantitative_score: None,
        created_at: Some(created_at),
    }
}

pub(super) fn qualitative(assessment: &str, total: f64) -> QualitativeScore {
    QualitativeScore {
        assessment_id: AssessmentId(assessment.to_string()),
        leadership_score: None,
        sustainable_score: None,
        total_score: Some(total),
    }
}

pub(super) fn impact(assessment: &str, total: f64) -> ImpactScore {
    ImpactScore {
        assessment_id: AssessmentId(assessment.to_string()),
        had_incident: total < 15.0,
        incident_score: None,
        had_data_breach: false,
        breach_score: None,
        total_score: Some(total),
    }
}

fn unit(id: UnitId, name: &str, province_code: &str) -> OrgUnit {
    OrgUnit {
        id,
        name: name.to_string(),
        province_code: province_code.to_string(),
    }
}

/// Two regions, three provinces, six units.
///
/// R1/P10: H1, H2, O1. R1/P11: H3. R2/P20: H4, H5.
pub(super) fn directory() -> OrganizationDirectory {
    OrganizationDirectory::new(
        vec![
            Region {
                code: "R1".to_string(),
                name: "Health Region 1".to_string(),
            },
            Region {
                code: "R2".to_string(),
                name: "Health Region 2".to_string(),
            },
        ],
        vec![
            Province {
                code: "P10".to_string(),
                name: "Chiang Mai".to_string(),
                region_code: "R1".to_string(),
            },
            Province {
                code: "P11".to_string(),
                name: "Lamphun".to_string(),
                region_code: "R1".to_string(),
            },
            Province {
                code: "P20".to_string(),
                name: "Phitsanulok".to_string(),
                region_code: "R2".to_string(),
            },
        ],
        vec![
            unit(UnitId::hospital("H1"), "Nakornping Hospital", "P10"),
            unit(UnitId::hospital("H2"), "Sansai Hospital", "P10"),
            unit(UnitId::health_office("O1"), "Chiang Mai Provincial Health Office", "P10"),
            unit(UnitId::hospital("H3"), "Lamphun Hospital", "P11"),
            unit(UnitId::hospital("H4"), "Buddhachinaraj Hospital", "P20"),
            unit(UnitId::hospital("H5"), "Wang Thong Hospital", "P20"),
        ],
    )
}

/// Records behind most service and routing tests.
///
/// For fiscal year 2568 the latest approved assessments are H1 (12 of 17),
/// O1 (all 17) and H4 (none). H2 is only submitted, H3 was approved in 2567
/// and H5 has never been assessed.
pub(super) fn sample_repository() -> MemoryRepository {
    let categories = categories();
    let mut items = Vec::new();
    items.extend(items_passing("a-h1-old", &categories, CATEGORY_COUNT));
    items.extend(items_passing("a-h1-new", &categories, 12));
    items.extend(items_passing("a-h2", &categories, CATEGORY_COUNT));
    items.extend(items_passing("a-o1", &categories, CATEGORY_COUNT));
    items.extend(items_passing("a-h3", &categories, CATEGORY_COUNT));
    items.extend(items_passing("a-h4", &categories, 0));

    MemoryRepository {
        categories,
        directory: directory(),
        assessments: vec![
            assessment("a-h3", UnitId::hospital("H3"), "approved", 2567, day(2023, 11, 2)),
            assessment("a-h1-old", UnitId::hospital("H1"), "approved", FISCAL_YEAR, day(2024, 10, 1)),
            assessment("a-h4", UnitId::hospital("H4"), "Approved", FISCAL_YEAR, day(2024, 10, 20)),
            assessment("a-o1", UnitId::health_office("O1"), "approved", FISCAL_YEAR, day(2024, 11, 3)),
            assessment("a-h2", UnitId::hospital("H2"), "submitted", FISCAL_YEAR, day(2024, 11, 15)),
            assessment("a-h1-new", UnitId::hospital("H1"), "approved", FISCAL_YEAR, day(2024, 12, 1)),
        ],
        items,
        qualitative: HashMap::from([(
            AssessmentId("a-o1".to_string()),
            qualitative("a-o1", 12.0),
        )]),
        impact: HashMap::from([(AssessmentId("a-h4".to_string()), impact("a-h4", 0.0))]),
    }
}

pub(super) fn sample_service() -> ScoringService<MemoryRepository> {
    ScoringService::new(Arc::new(sample_repository()), ScoringRules::default())
}

pub(super) fn scoring_router_with_service(
    service: ScoringService<MemoryRepository>,
) -> Router {
    scoring_router(Arc::new(service))
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) categories: Vec<Category>,
    pub(super) directory: OrganizationDirectory,
    pub(super) assessments: Vec<Assessment>,
    pub(super) items: Vec<AssessmentItem>,
    pub(super) qualitative: HashMap<AssessmentId, QualitativeScore>,
    pub(super) impact: HashMap<AssessmentId, ImpactScore>,
}

impl AssessmentRepository for MemoryRepository {
    fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self.categories.clone())
    }

    fn directory(&self) -> Result<OrganizationDirectory, RepositoryError> {
        Ok(self.directory.clone())
    }

    fn assessments(&self) -> Result<Vec<Assessment>, RepositoryError> {
        Ok(self.assessments.clone())
    }

    fn assessment(&self, id: &AssessmentId) -> Result<Option<Assessment>, RepositoryError> {
        Ok(self.assessments.iter().find(|a| &a.id == id).cloned())
    }

    fn items(&self) -> Result<Vec<AssessmentItem>, RepositoryError> {
        Ok(self.items.clone())
    }

    fn items_for(&self, id: &AssessmentId) -> Result<Vec<AssessmentItem>, RepositoryError> {
        Ok(self
            .items
            .iter()
            .filter(|item| &item.assessment_id == id)
            .cloned()
            .collect())
    }

    fn qualitative_score(
        &self,
        id: &AssessmentId,
    ) -> Result<Option<QualitativeScore>, RepositoryError> {
        Ok(self.qualitative.get(id).cloned())
    }

    fn impact_score(&self, id: &AssessmentId) -> Result<Option<ImpactScore>, RepositoryError> {
        Ok(self.impact.get(id).cloned())
    }
}

pub(super) struct UnavailableRepository;

impl AssessmentRepository for UnavailableRepository {
    fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        Err(unavailable())
    }

    fn directory(&self) -> Result<OrganizationDirectory, RepositoryError> {
        Err(unavailable())
    }

    fn assessments(&self) -> Result<Vec<Assessment>, RepositoryError> {
        Err(unavailable())
    }

    fn assessment(&self, _id: &AssessmentId) -> Result<Option<Assessment>, RepositoryError> {
        Err(unavailable())
    }

    fn items(&self) -> Result<Vec<AssessmentItem>, RepositoryError> {
        Err(unavailable())
    }

    fn items_for(&self, _id: &AssessmentId) -> Result<Vec<AssessmentItem>, RepositoryError> {
        Err(unavailable())
    }

    fn qualitative_score(
        &self,
        _id: &AssessmentId,
    ) -> Result<Option<QualitativeScore>, RepositoryError> {
        Err(unavailable())
    }

    fn impact_score(&self, _id: &AssessmentId) -> Result<Option<ImpactScore>, RepositoryError> {
        Err(unavailable())
    }
}

fn unavailable() -> RepositoryError {
    RepositoryError::Unavailable("connection refused".to_string())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 64)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn approx(left: f64, right: f64) -> bool {
    (left - right).abs() < 1e-9
}
