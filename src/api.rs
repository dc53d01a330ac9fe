use crate::error::InsightsError;
use crate::forecast::{forecast_by_crop, forecast_year};
use crate::reports::{aggregate_by_crop, filter_rows};
use crate::types::{AggregateRow, ForecastRow, Record};
use crate::util::{f64_to_i32, parse_i32_safe};
use axum::{
    body::Bytes,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

pub const DEFAULT_REGIONS: [&str; 2] = ["Ratnapura", "Kegalle"];
pub const DEFAULT_SEASONS: [&str; 2] = ["Maha", "Yala"];
pub const DEFAULT_SEASON: &str = "Maha";
pub const DEFAULT_AGGREGATE_YEARS: [i32; 2] = [2024, 2025];
pub const DEFAULT_FORECAST_YEARS: [i32; 4] = [2022, 2023, 2024, 2025];

/// Shared, read-only dataset handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Vec<Record>>,
}

pub fn build_router(dataset: Vec<Record>) -> Router {
    let state = AppState {
        dataset: Arc::new(dataset),
    };

    Router::new()
        .route("/api/aggregate", post(aggregate_handler))
        .route("/api/forecast", post(forecast_handler))
        .route("/api/health", get(health_handler))
        .with_state(state)
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateQuery {
    pub regions: Vec<String>,
    pub seasons: Vec<String>,
    pub years: Vec<i32>,
}

impl AggregateQuery {
    pub fn from_body(body: &Value) -> Self {
        Self {
            regions: string_list(body.get("regions"), &DEFAULT_REGIONS),
            seasons: string_list(body.get("seasons"), &DEFAULT_SEASONS),
            years: year_list(body.get("years"), &DEFAULT_AGGREGATE_YEARS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastQuery {
    pub regions: Vec<String>,
    pub season: String,
    pub years: Vec<i32>,
}

impl ForecastQuery {
    pub fn from_body(body: &Value) -> Self {
        let season = match body.get("season") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => DEFAULT_SEASON.to_string(),
        };
        Self {
            regions: string_list(body.get("regions"), &DEFAULT_REGIONS),
            season,
            years: year_list(body.get("years"), &DEFAULT_FORECAST_YEARS),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChartResponse<M> {
    pub labels: Vec<String>,
    pub supply: Vec<f64>,
    pub demand: Vec<f64>,
    pub positive_gap: Vec<f64>,
    pub meta: M,
}

#[derive(Debug, Serialize)]
pub struct AggregateMeta {
    pub regions: Vec<String>,
    pub seasons: Vec<String>,
    pub years: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct ForecastMeta {
    pub regions: Vec<String>,
    pub season_forecasted: String,
    pub train_years: Vec<i32>,
    pub forecast_year: Option<i32>,
}

impl ChartResponse<AggregateMeta> {
    fn from_rows(rows: Vec<AggregateRow>, query: AggregateQuery) -> Self {
        let mut out = Self {
            labels: Vec::with_capacity(rows.len()),
            supply: Vec::with_capacity(rows.len()),
            demand: Vec::with_capacity(rows.len()),
            positive_gap: Vec::with_capacity(rows.len()),
            meta: AggregateMeta {
                regions: query.regions,
                seasons: query.seasons,
                years: query.years,
            },
        };
        for r in rows {
            out.labels.push(r.crop);
            out.supply.push(r.total_supply_t);
            out.demand.push(r.total_demand_t);
            out.positive_gap.push(r.positive_gap_t);
        }
        out
    }
}

impl ChartResponse<ForecastMeta> {
    fn from_rows(rows: Vec<ForecastRow>, query: ForecastQuery) -> Self {
        let mut out = Self {
            labels: Vec::with_capacity(rows.len()),
            supply: Vec::with_capacity(rows.len()),
            demand: Vec::with_capacity(rows.len()),
            positive_gap: Vec::with_capacity(rows.len()),
            meta: ForecastMeta {
                forecast_year: forecast_year(&query.years),
                regions: query.regions,
                season_forecasted: query.season,
                train_years: query.years,
            },
        };
        for r in rows {
            out.labels.push(r.crop);
            out.supply.push(r.forecast_supply_t);
            out.demand.push(r.forecast_demand_t);
            out.positive_gap.push(r.forecast_positive_gap_t);
        }
        out
    }
}

/// POST /api/aggregate: historical supply and demand per crop.
async fn aggregate_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChartResponse<AggregateMeta>>, InsightsError> {
    let query = AggregateQuery::from_body(&parse_body(&body));
    debug!(?query, "aggregate request");

    let dataset = state.dataset.clone();
    let q = query.clone();
    let rows = tokio::task::spawn_blocking(move || {
        let rows = filter_rows(&dataset, &q.regions, &q.seasons, &q.years);
        aggregate_by_crop(&rows)
    })
    .await
    .map_err(|e| {
        error!("aggregate error: {e}");
        InsightsError::Aggregate(e.to_string())
    })?;

    Ok(Json(ChartResponse::<AggregateMeta>::from_rows(rows, query)))
}

/// POST /api/forecast: next-year projection per crop for one season.
async fn forecast_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChartResponse<ForecastMeta>>, InsightsError> {
    let query = ForecastQuery::from_body(&parse_body(&body));
    debug!(?query, "forecast request");

    let dataset = state.dataset.clone();
    let q = query.clone();
    let rows = tokio::task::spawn_blocking(move || {
        let seasons = [q.season.clone()];
        let rows = filter_rows(&dataset, &q.regions, &seasons, &q.years);
        forecast_by_crop(&rows, &q.years, &q.season)
    })
    .await
    .map_err(|e| {
        error!("forecast error: {e}");
        InsightsError::Forecast(e.to_string())
    })?;

    Ok(Json(ChartResponse::<ForecastMeta>::from_rows(rows, query)))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "rows_loaded": state.dataset.len(),
    }))
}

/// An absent or unparsable body behaves like `{}`.
fn parse_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

/// A JSON list of strings, or `default` when the field is missing or not a
/// list. Non-string elements are dropped.
fn string_list(v: Option<&Value>, default: &[&str]) -> Vec<String> {
    match v {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|i| i.as_str().map(str::to_string))
            .collect(),
        _ => default.iter().map(|s| s.to_string()).collect(),
    }
}

/// A JSON list of years given as numbers or numeric strings. Elements that
/// are not whole numbers are dropped.
fn year_list(v: Option<&Value>, default: &[i32]) -> Vec<i32> {
    match v {
        Some(Value::Array(items)) => items.iter().filter_map(coerce_year).collect(),
        _ => default.to_vec(),
    }
}

fn coerce_year(v: &Value) -> Option<i32> {
    match v {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i32::try_from(i).ok(),
            None => n.as_f64().and_then(f64_to_i32),
        },
        Value::String(s) => parse_i32_safe(Some(s.as_str())),
        _ => None,
    }
}
