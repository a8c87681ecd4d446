use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use kapasda::scoring::{
    AssessmentService, AssessmentServiceError, BenchmarkError, Granularity, IndicatorCode,
    RecapFilter, RecomputeFailure, RecomputeReport, RegionId, RegionInputs, UnknownGranularity,
};
use kapasda::storage::{BenchmarkRepository, PersistenceError, RegionRepository};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::infra::AppState;

pub(crate) fn with_assessment_routes<R, B>(service: Arc<AssessmentService<R, B>>) -> Router
where
    R: RegionRepository + 'static,
    B: BenchmarkRepository + 'static,
{
    assessment_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

/// JSON endpoints over one assessment service.
pub(crate) fn assessment_router<R, B>(service: Arc<AssessmentService<R, B>>) -> Router
where
    R: RegionRepository + 'static,
    B: BenchmarkRepository + 'static,
{
    Router::new()
        .route("/api/v1/catalog", get(catalog_handler::<R, B>))
        .route(
            "/api/v1/benchmarks",
            get(benchmarks_handler::<R, B>).put(update_benchmarks_handler::<R, B>),
        )
        .route(
            "/api/v1/benchmarks/reset",
            post(reset_benchmarks_handler::<R, B>),
        )
        .route(
            "/api/v1/benchmarks/recompute",
            post(recompute_handler::<R, B>),
        )
        .route(
            "/api/v1/regions/:granularity/:name",
            get(record_handler::<R, B>).put(save_handler::<R, B>),
        )
        .route(
            "/api/v1/regions/:granularity/:name/preview",
            post(preview_handler::<R, B>),
        )
        .route("/api/v1/recap", get(recap_handler::<R, B>))
        .with_state(service)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    if state.readiness.load(std::sync::atomic::Ordering::Relaxed) {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Maps service failures onto HTTP statuses.
pub(crate) struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn unprocessable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }
}

impl From<AssessmentServiceError> for ApiError {
    fn from(error: AssessmentServiceError) -> Self {
        let status = match &error {
            AssessmentServiceError::Benchmark(BenchmarkError::Configuration(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AssessmentServiceError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AssessmentServiceError::Persistence(PersistenceError::NotFound) => StatusCode::NOT_FOUND,
            AssessmentServiceError::Persistence(PersistenceError::Unavailable(_))
            | AssessmentServiceError::Benchmark(BenchmarkError::Persistence(_))
            | AssessmentServiceError::Recompute(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GranularityQuery {
    #[serde(default)]
    granularity: Option<String>,
}

impl GranularityQuery {
    fn resolve(&self) -> Result<Granularity, ApiError> {
        match &self.granularity {
            Some(value) => value
                .parse()
                .map_err(|error: UnknownGranularity| {
                    ApiError::unprocessable(error.to_string())
                }),
            None => Ok(Granularity::Kecamatan),
        }
    }
}

fn region_id(granularity: &str, name: String) -> Result<RegionId, ApiError> {
    let granularity: Granularity = granularity
        .parse()
        .map_err(|error: UnknownGranularity| {
            ApiError::unprocessable(error.to_string())
        })?;
    if name.trim().is_empty() {
        return Err(ApiError::unprocessable("region name must not be empty"));
    }
    Ok(RegionId::new(granularity, name))
}

pub(crate) async fn catalog_handler<R, B>(
    State(service): State<Arc<AssessmentService<R, B>>>,
    Query(query): Query<GranularityQuery>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    R: RegionRepository + 'static,
    B: BenchmarkRepository + 'static,
{
    let granularity = query.resolve()?;
    let engine = service.engines().for_granularity(granularity);
    let catalog = engine.catalog();
    Ok(Json(json!({
        "granularity": granularity,
        "version": catalog.version(),
        "indicators": catalog.len(),
        "max_total": catalog.max_total(),
        "threshold": engine.policy().threshold,
        "groups": catalog.groups(),
    })))
}

pub(crate) async fn benchmarks_handler<R, B>(
    State(service): State<Arc<AssessmentService<R, B>>>,
    Query(query): Query<GranularityQuery>,
) -> Result<Response, ApiError>
where
    R: RegionRepository + 'static,
    B: BenchmarkRepository + 'static,
{
    let entries = service.benchmark_entries(query.resolve()?)?;
    Ok((StatusCode::OK, Json(entries)).into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct BenchmarkUpdateRequest {
    values: BTreeMap<IndicatorCode, f64>,
    #[serde(default)]
    recompute: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RecomputeQuery {
    #[serde(default)]
    recompute: bool,
}

/// Report without the full recomputed records.
#[derive(Debug, Serialize)]
pub(crate) struct RecomputeView {
    summary: String,
    succeeded: usize,
    failed: usize,
    skipped: usize,
    failures: Vec<RecomputeFailure>,
}

impl From<RecomputeReport> for RecomputeView {
    fn from(report: RecomputeReport) -> Self {
        Self {
            summary: report.summary(),
            succeeded: report.succeeded(),
            failed: report.failed(),
            skipped: report.skipped,
            failures: report.failures,
        }
    }
}

pub(crate) async fn update_benchmarks_handler<R, B>(
    State(service): State<Arc<AssessmentService<R, B>>>,
    Json(request): Json<BenchmarkUpdateRequest>,
) -> Result<Response, ApiError>
where
    R: RegionRepository + 'static,
    B: BenchmarkRepository + 'static,
{
    let updated = request.values.len();
    let report = service
        .update_benchmarks(request.values, request.recompute)
        .await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "updated": updated,
            "recompute": report.map(RecomputeView::from),
        })),
    )
        .into_response())
}

pub(crate) async fn reset_benchmarks_handler<R, B>(
    State(service): State<Arc<AssessmentService<R, B>>>,
    Query(query): Query<RecomputeQuery>,
) -> Result<Response, ApiError>
where
    R: RegionRepository + 'static,
    B: BenchmarkRepository + 'static,
{
    let report = service.reset_benchmarks(query.recompute).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "reset": true,
            "recompute": report.map(RecomputeView::from),
        })),
    )
        .into_response())
}

pub(crate) async fn recompute_handler<R, B>(
    State(service): State<Arc<AssessmentService<R, B>>>,
) -> Result<Json<RecomputeView>, ApiError>
where
    R: RegionRepository + 'static,
    B: BenchmarkRepository + 'static,
{
    let report = service.recompute().await?;
    Ok(Json(report.into()))
}

pub(crate) async fn preview_handler<R, B>(
    State(service): State<Arc<AssessmentService<R, B>>>,
    Path((granularity, name)): Path<(String, String)>,
    Json(inputs): Json<RegionInputs>,
) -> Result<Response, ApiError>
where
    R: RegionRepository + 'static,
    B: BenchmarkRepository + 'static,
{
    let region = region_id(&granularity, name)?;
    let result = service.preview(&region, &inputs)?;
    Ok((StatusCode::OK, Json(result)).into_response())
}

pub(crate) async fn save_handler<R, B>(
    State(service): State<Arc<AssessmentService<R, B>>>,
    Path((granularity, name)): Path<(String, String)>,
    Json(inputs): Json<RegionInputs>,
) -> Result<Response, ApiError>
where
    R: RegionRepository + 'static,
    B: BenchmarkRepository + 'static,
{
    let region = region_id(&granularity, name)?;
    let record = service.save(region, inputs).await?;
    Ok((StatusCode::OK, Json(record)).into_response())
}

pub(crate) async fn record_handler<R, B>(
    State(service): State<Arc<AssessmentService<R, B>>>,
    Path((granularity, name)): Path<(String, String)>,
) -> Result<Response, ApiError>
where
    R: RegionRepository + 'static,
    B: BenchmarkRepository + 'static,
{
    let region = region_id(&granularity, name)?;
    let record = service.record(&region).await?;
    Ok((StatusCode::OK, Json(record)).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RecapQuery {
    #[serde(default)]
    status: Option<String>,
}

pub(crate) async fn recap_handler<R, B>(
    State(service): State<Arc<AssessmentService<R, B>>>,
    Query(query): Query<RecapQuery>,
) -> Result<Response, ApiError>
where
    R: RegionRepository + 'static,
    B: BenchmarkRepository + 'static,
{
    let filter = match query.status.as_deref() {
        Some(status) => status
            .parse::<RecapFilter>()
            .map_err(|error| ApiError::unprocessable(error.to_string()))?,
        None => RecapFilter::All,
    };
    let recap = service.recap(filter).await?;
    Ok((StatusCode::OK, Json(recap)).into_response())
}
