use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use ctam_scoring::scoring::domain::numeric;
use ctam_scoring::scoring::{
    scoring_router, AssessmentId, AssessmentItem, AssessmentRepository, Category, CategoryEvaluator,
    CategoryId, CompositeScore, CompositeScoreCalculator, ImpactScore, ItemId, ItemStatus,
    QualitativeScore, QualityLevel, ScoringRules, ScoringService, StatusScheme,
    UnitCategoryResult, UnitEvaluation,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

const PREVIEW_ASSESSMENT: &str = "preview";

/// Unsaved assessment scored on the fly.
#[derive(Debug, Deserialize)]
pub(crate) struct ScorecardPreviewRequest {
    pub(crate) categories: Vec<Category>,
    #[serde(default)]
    pub(crate) items: Vec<PreviewItem>,
    #[serde(default)]
    pub(crate) qualitative: Option<PreviewQualitative>,
    #[serde(default)]
    pub(crate) impact: Option<PreviewImpact>,
    #[serde(default)]
    pub(crate) scheme: Option<StatusScheme>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreviewItem {
    pub(crate) category_id: CategoryId,
    pub(crate) status: ItemStatus,
    #[serde(default, deserialize_with = "numeric::optional_number")]
    pub(crate) score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreviewQualitative {
    #[serde(default, deserialize_with = "numeric::optional_number")]
    pub(crate) leadership_score: Option<f64>,
    #[serde(default, deserialize_with = "numeric::optional_number")]
    pub(crate) sustainable_score: Option<f64>,
    #[serde(default, deserialize_with = "numeric::optional_number")]
    pub(crate) total_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreviewImpact {
    #[serde(default)]
    pub(crate) had_incident: bool,
    #[serde(default, deserialize_with = "numeric::optional_number")]
    pub(crate) incident_score: Option<f64>,
    #[serde(default)]
    pub(crate) had_data_breach: bool,
    #[serde(default, deserialize_with = "numeric::optional_number")]
    pub(crate) breach_score: Option<f64>,
    #[serde(default, deserialize_with = "numeric::optional_number")]
    pub(crate) total_score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScorecardPreviewResponse {
    pub(crate) scheme: &'static str,
    pub(crate) evaluation: UnitEvaluation,
    pub(crate) categories: Vec<UnitCategoryResult>,
    pub(crate) composite: CompositeScore,
    pub(crate) level_label: &'static str,
    pub(crate) level_label_th: &'static str,
    pub(crate) quantitative_level: QualityLevel,
}

pub(crate) fn with_scoring_routes<R>(service: Arc<ScoringService<R>>) -> axum::Router
where
    R: AssessmentRepository + 'static,
{
    scoring_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/scorecards/preview",
            axum::routing::post(scorecard_preview_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Scores an unsaved assessment with the configured level table.
///
/// The request may override the status scheme; everything else comes from
/// the server's scoring rules.
pub(crate) async fn scorecard_preview_endpoint(
    Extension(rules): Extension<Arc<ScoringRules>>,
    Json(payload): Json<ScorecardPreviewRequest>,
) -> Json<ScorecardPreviewResponse> {
    let ScorecardPreviewRequest {
        categories,
        items,
        qualitative,
        impact,
        scheme,
    } = payload;

    let assessment_id = AssessmentId(PREVIEW_ASSESSMENT.to_string());
    let items: Vec<AssessmentItem> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| AssessmentItem {
            id: ItemId(format!("{PREVIEW_ASSESSMENT}-{index}")),
            assessment_id: assessment_id.clone(),
            category_id: item.category_id,
            status: item.status,
            score: item.score,
        })
        .collect();
    let qualitative = qualitative.map(|score| QualitativeScore {
        assessment_id: assessment_id.clone(),
        leadership_score: score.leadership_score,
        sustainable_score: score.sustainable_score,
        total_score: score.total_score,
    });
    let impact = impact.map(|score| ImpactScore {
        assessment_id: assessment_id.clone(),
        had_incident: score.had_incident,
        incident_score: score.incident_score,
        had_data_breach: score.had_data_breach,
        breach_score: score.breach_score,
        total_score: score.total_score,
    });

    let evaluator = CategoryEvaluator::new(scheme.unwrap_or(rules.scheme));
    let calculator = CompositeScoreCalculator::new(rules.quality_table.clone());
    let evaluation = evaluator.evaluate_unit(&categories, &items);
    let composite = calculator.score(&evaluation, qualitative.as_ref(), impact.as_ref());

    Json(ScorecardPreviewResponse {
        scheme: evaluator.scheme().label(),
        categories: evaluator.evaluate_categories(&categories, &items),
        level_label: composite.level.label(),
        level_label_th: composite.level.label_th(),
        quantitative_level: calculator.percentage_level(evaluation.percentage).level,
        evaluation,
        composite,
    })
}
