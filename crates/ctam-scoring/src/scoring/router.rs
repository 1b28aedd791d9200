use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::AssessmentId;
use super::repository::AssessmentRepository;
use super::service::{ReportScope, ScoringService, ScoringServiceError};

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub fiscal_year: Option<i32>,
}

impl From<ReportQuery> for ReportScope {
    fn from(query: ReportQuery) -> Self {
        ReportScope {
            fiscal_year: query.fiscal_year,
            visible_units: None,
        }
    }
}

/// Router exposing scorecards and drill-down reports.
pub fn scoring_router<R>(service: Arc<ScoringService<R>>) -> Router
where
    R: AssessmentRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/assessments/:assessment_id/scorecard",
            get(scorecard_handler::<R>),
        )
        .route("/api/v1/reports/country", get(country_handler::<R>))
        .route(
            "/api/v1/reports/regions/:region_code",
            get(region_handler::<R>),
        )
        .route(
            "/api/v1/reports/provinces/:province_code",
            get(province_handler::<R>),
        )
        .route("/api/v1/reports/levels", get(levels_handler::<R>))
        .with_state(service)
}

pub(crate) async fn scorecard_handler<R>(
    State(service): State<Arc<ScoringService<R>>>,
    Path(assessment_id): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    into_response(service.scorecard(&AssessmentId(assessment_id)))
}

pub(crate) async fn country_handler<R>(
    State(service): State<Arc<ScoringService<R>>>,
    Query(query): Query<ReportQuery>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    into_response(service.country_report(&query.into()))
}

pub(crate) async fn region_handler<R>(
    State(service): State<Arc<ScoringService<R>>>,
    Path(region_code): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    into_response(service.region_report(&region_code, &query.into()))
}

pub(crate) async fn province_handler<R>(
    State(service): State<Arc<ScoringService<R>>>,
    Path(province_code): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    into_response(service.province_report(&province_code, &query.into()))
}

pub(crate) async fn levels_handler<R>(
    State(service): State<Arc<ScoringService<R>>>,
    Query(query): Query<ReportQuery>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    into_response(service.level_distribution(&query.into()))
}

fn into_response<T: Serialize>(result: Result<T, ScoringServiceError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, axum::Json(body)).into_response(),
        Err(
            error @ (ScoringServiceError::AssessmentNotFound(_)
            | ScoringServiceError::RegionNotFound(_)
            | ScoringServiceError::ProvinceNotFound(_)),
        ) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
