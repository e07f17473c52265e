use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use cropcast_core::domain::forecast::{
    ForecastParams, ForecastResult, MarketAnalysis, RankLimit, RankedEntry, SkippedCommodity,
    DEFAULT_HORIZON,
};
use cropcast_core::domain::series::SeriesSummary;
use cropcast_core::error::ForecastError;
use cropcast_core::ingest::source::{SeriesSource, SkippedSource};
use cropcast_core::service::{ForecastService, NoiseSeed};
use cropcast_core::storage::handle::StoreHandle;
use cropcast_core::storage::SeriesStore;
use cropcast_core::time::calendar::resolve_start_month;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<StoreHandle>,
    pub source: Arc<dyn SeriesSource>,
    pub seed: NoiseSeed,
}

impl AppState {
    fn service(&self) -> ForecastService {
        ForecastService::new(self.store.snapshot(), self.seed)
    }
}

#[derive(Debug)]
pub enum ApiError {
    Forecast(ForecastError),
    Internal(anyhow::Error),
}

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        ApiError::Forecast(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

pub fn status_for(err: &ForecastError) -> StatusCode {
    match err {
        ForecastError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ForecastError::NotFound { .. } => StatusCode::NOT_FOUND,
        ForecastError::Unavailable { .. } | ForecastError::NoForecasts { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Forecast(err) => {
                tracing::info!(kind = err.kind(), error = %err, "request rejected");
                let body = json!({ "error": err.kind(), "detail": err.to_string() });
                (status_for(&err), Json(body)).into_response()
            }
            ApiError::Internal(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "request failed");
                let body = json!({ "error": "internal", "detail": format!("{err:#}") });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ForecastQuery {
    pub current_month: Option<i64>,
    pub forecast_months: Option<i64>,
}

impl ForecastQuery {
    fn params(&self, now: DateTime<Utc>) -> Result<ForecastParams, ForecastError> {
        forecast_params(self.current_month, self.forecast_months, now)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RankQuery {
    pub current_month: Option<i64>,
    pub forecast_months: Option<i64>,
    pub n: Option<i64>,
}

impl RankQuery {
    fn params(&self, now: DateTime<Utc>) -> Result<(ForecastParams, RankLimit), ForecastError> {
        let params = forecast_params(self.current_month, self.forecast_months, now)?;
        let limit = match self.n {
            Some(n) => RankLimit::new(n)?,
            None => RankLimit::default(),
        };
        Ok((params, limit))
    }
}

fn forecast_params(
    current_month: Option<i64>,
    forecast_months: Option<i64>,
    now: DateTime<Utc>,
) -> Result<ForecastParams, ForecastError> {
    ForecastParams::new(
        resolve_start_month(current_month, now),
        forecast_months.unwrap_or(DEFAULT_HORIZON as i64),
    )
}

pub async fn root(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "message": "Commodity price forecasting API running",
        "version": env!("CARGO_PKG_VERSION"),
        "available_endpoints": [
            "/commodities - list available commodities",
            "/predict/{name} - forecast one commodity",
            "/forecast - forecast all commodities",
            "/commodity-info/{name} - historical summary for one commodity",
            "/top-performers - commodities with the highest projected growth",
            "/bottom-performers - commodities with the lowest projected growth",
            "/market-analysis - market overview with top and bottom performers",
        ],
        "total_commodities": state.store.snapshot().len(),
    }))
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "commodities_loaded": state.store.snapshot().len(),
    }))
}

#[derive(Debug, Serialize)]
pub struct CommodityList {
    pub available_commodities: Vec<String>,
    pub total_count: usize,
}

pub async fn list_commodities(State(state): State<AppState>) -> Json<CommodityList> {
    let available_commodities = state.service().list_commodities();
    Json(CommodityList {
        total_count: available_commodities.len(),
        available_commodities,
    })
}

pub async fn predict(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<ForecastResult>, ApiError> {
    let params = query.params(Utc::now())?;
    let result = state.service().forecast(&name, params)?;
    Ok(Json(result))
}

#[derive(Debug, Serialize)]
pub struct AllForecasts {
    pub current_month: u32,
    pub forecast_months: usize,
    pub total_commodities: usize,
    pub forecasts: Vec<ForecastResult>,
    pub skipped: Vec<SkippedCommodity>,
}

pub async fn forecast_all(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<AllForecasts>, ApiError> {
    let params = query.params(Utc::now())?;
    let batch = state.service().forecast_all(params)?;
    Ok(Json(AllForecasts {
        current_month: params.start_month(),
        forecast_months: params.horizon(),
        total_commodities: batch.items.len(),
        forecasts: batch.items,
        skipped: batch.skipped,
    }))
}

pub async fn commodity_info(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SeriesSummary>, ApiError> {
    Ok(Json(state.service().summary(&name)?))
}

pub async fn top_performers(
    State(state): State<AppState>,
    Query(query): Query<RankQuery>,
) -> Result<Json<Vec<RankedEntry>>, ApiError> {
    let (params, limit) = query.params(Utc::now())?;
    Ok(Json(state.service().top_performers(params, limit)?))
}

pub async fn bottom_performers(
    State(state): State<AppState>,
    Query(query): Query<RankQuery>,
) -> Result<Json<Vec<RankedEntry>>, ApiError> {
    let (params, limit) = query.params(Utc::now())?;
    Ok(Json(state.service().bottom_performers(params, limit)?))
}

pub async fn market_analysis(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<MarketAnalysis>, ApiError> {
    let now = Utc::now();
    let params = query.params(now)?;
    Ok(Json(state.service().market_analysis(params, now)?))
}

#[derive(Debug, Serialize)]
pub struct ReloadSummary {
    pub source: &'static str,
    pub loaded: usize,
    pub skipped: Vec<SkippedSource>,
}

/// Reloads every series from the source and swaps the store only once loading has succeeded.
pub async fn reload(State(state): State<AppState>) -> Result<Json<ReloadSummary>, ApiError> {
    let report = state.source.load_all().await?;
    let skipped = report.skipped.clone();
    let store = SeriesStore::from_report(report);
    let loaded = store.len();
    state.store.replace(store);

    tracing::info!(
        source = state.source.source_name(),
        loaded,
        skipped = skipped.len(),
        "store reloaded"
    );
    Ok(Json(ReloadSummary {
        source: state.source.source_name(),
        loaded,
        skipped,
    }))
}
