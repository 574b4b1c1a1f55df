use crate::config::AnalysisConfig;
use crate::errors::{AnalysisError, AnalysisResult};
use crate::feeds;
use crate::models::cointegration::{self, CointegrationResult, SpreadPoint};
use crate::models;
use crate::paper::performance::{self, PerformanceResult};
use crate::paper::backtest;
use crate::series::{PricePoint, PriceSeries};
use crate::server::respond::{finish, to_data, ApiError, ApiResult};
use crate::state::{AppState, PerfCounters};
use crate::strategy::signals::{self, SignalPoint};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{Json, Response};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::Instrument;

/// Body shared by the pair endpoints; each route reads the fields it needs.
#[derive(Debug, Default, serde::Deserialize)]
pub struct PairRequest {
    pub stock1: Option<String>,
    pub stock2: Option<String>,
    pub period: Option<String>,
    pub entry_threshold: Option<f64>,
    pub exit_threshold: Option<f64>,
    pub initial_capital: Option<f64>,
}

/// A validated symbol pair and history window.
#[derive(Debug, Clone, PartialEq)]
struct PairQuery {
    stock1: String,
    stock2: String,
    period: String,
}

#[derive(serde::Serialize)]
struct CointegrationPayload<'a> {
    cointegration_results: &'a CointegrationResult,
    spread_data: &'a [SpreadPoint],
    stock1_data: &'a [PricePoint],
    stock2_data: &'a [PricePoint],
}

#[derive(serde::Serialize)]
struct SignalsPayload<'a> {
    signals: &'a [SignalPoint],
    performance: &'a PerformanceResult,
    spread_stats: SpreadStats,
}

#[derive(serde::Serialize)]
struct SpreadStats {
    mean: f64,
    /// Population dispersion of the raw spread.
    std: f64,
    current_zscore: f64,
}

/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    PerfCounters::bump(&state.counters.requests_received);
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// GET /api/stocks -- the tradable catalog
pub async fn stocks(State(state): State<Arc<AppState>>) -> Json<Value> {
    PerfCounters::bump(&state.counters.requests_received);
    Json(json!({ "success": true, "stocks": state.config.symbols }))
}

/// POST /api/cointegration-test
pub async fn cointegration_test(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PairRequest>, JsonRejection>,
) -> Response {
    PerfCounters::bump(&state.counters.requests_received);
    let result = run_cointegration_test(&state, body)
        .instrument(request_span("cointegration-test"))
        .await;
    finish(&state, result)
}

/// POST /api/trading-signals
pub async fn trading_signals(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PairRequest>, JsonRejection>,
) -> Response {
    PerfCounters::bump(&state.counters.requests_received);
    let result = run_trading_signals(&state, body)
        .instrument(request_span("trading-signals"))
        .await;
    finish(&state, result)
}

/// POST /api/backtest -- a non-cointegrated pair is a 200 with an `error` field
pub async fn backtest(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PairRequest>, JsonRejection>,
) -> Response {
    PerfCounters::bump(&state.counters.requests_received);
    let result = run_backtest(&state, body)
        .instrument(request_span("backtest"))
        .await;
    finish(&state, result)
}

async fn run_cointegration_test(
    state: &AppState,
    body: Result<Json<PairRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let req = read_body(body)?;
    let pair = validate_pair(state, &req, "1y")?;
    let (s1, s2) = fetch_pair(state, &pair).await?;

    let coint = cointegration::test_cointegration(&s1, &s2, state.config.analysis.significance)?;
    let spread = cointegration::calculate_spread(&s1, &s2, coint.beta)?;

    to_data(&CointegrationPayload {
        cointegration_results: &coint,
        spread_data: &spread,
        stock1_data: s1.points(),
        stock2_data: s2.points(),
    })
}

async fn run_trading_signals(
    state: &AppState,
    body: Result<Json<PairRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let req = read_body(body)?;
    let pair = validate_pair(state, &req, "1y")?;
    let cfg = analysis_config(state, &req)?;
    let (s1, s2) = fetch_pair(state, &pair).await?;

    let coint = cointegration::test_cointegration(&s1, &s2, cfg.significance)?;
    if !coint.is_cointegrated {
        tracing::info!(p_value = coint.p_value, "pair not cointegrated, no signals");
        return Err(ApiError::BadRequest(backtest::NOT_COINTEGRATED.to_string()));
    }

    let spread = cointegration::calculate_spread(&s1, &s2, coint.beta)?;
    let signals = signals::generate_signals(&spread, cfg.thresholds());
    tracing::debug!(rows = signals.len(), "signals generated");
    let perf = performance::calculate_performance(&s1, &s2, &signals, coint.beta)?;

    let raw: Vec<f64> = spread.iter().map(|p| p.spread).collect();
    to_data(&SignalsPayload {
        signals: &signals,
        performance: &perf,
        spread_stats: SpreadStats {
            mean: models::mean(&raw),
            std: models::population_std(&raw),
            current_zscore: spread.last().map_or(0.0, |p| p.z_score),
        },
    })
}

async fn run_backtest(
    state: &AppState,
    body: Result<Json<PairRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let req = read_body(body)?;
    let pair = validate_pair(state, &req, "2y")?;
    let cfg = analysis_config(state, &req)?;
    let capital = req.initial_capital.unwrap_or(state.config.initial_capital);
    if !(capital.is_finite() && capital > 0.0) {
        return Err(invalid("initial_capital must be a positive number"));
    }
    let (s1, s2) = fetch_pair(state, &pair).await?;

    let report = backtest::run_backtest_with(&s1, &s2, capital, cfg)?;
    to_data(&report)
}

/// GET /api/counters -- request counters (lock-free reads)
pub async fn counters(State(state): State<Arc<AppState>>) -> Json<Value> {
    let snapshot = state.counters.snapshot();
    Json(json!({
        "source": state.source.name(),
        "counters": snapshot,
    }))
}

fn request_span(route: &'static str) -> tracing::Span {
    tracing::info_span!(
        "request",
        id = %uuid::Uuid::new_v4(),
        route,
        stock1 = tracing::field::Empty,
        stock2 = tracing::field::Empty,
    )
}

fn read_body(body: Result<Json<PairRequest>, JsonRejection>) -> ApiResult<PairRequest> {
    body.map(|Json(req)| req).map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected request body");
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    })
}

fn validate_pair(state: &AppState, req: &PairRequest, default_period: &str) -> ApiResult<PairQuery> {
    let normalize = |s: &Option<String>| {
        s.as_deref()
            .map(|v| v.trim().to_ascii_uppercase())
            .filter(|v| !v.is_empty())
    };
    let (Some(stock1), Some(stock2)) = (normalize(&req.stock1), normalize(&req.stock2)) else {
        return Err(invalid("Both stocks required"));
    };
    if stock1 == stock2 {
        return Err(invalid("Select different stocks"));
    }
    for symbol in [&stock1, &stock2] {
        if !state.is_listed(symbol) {
            return Err(invalid(&format!("Unknown symbol: {symbol}")));
        }
    }

    let period = req.period.as_deref().unwrap_or(default_period).to_string();
    if !feeds::is_valid_period(&period) {
        return Err(invalid(&format!("Unsupported period: {period}")));
    }

    let span = tracing::Span::current();
    span.record("stock1", stock1.as_str());
    span.record("stock2", stock2.as_str());

    Ok(PairQuery {
        stock1,
        stock2,
        period,
    })
}

/// Request overrides on top of the configured thresholds.
fn analysis_config(state: &AppState, req: &PairRequest) -> ApiResult<AnalysisConfig> {
    let defaults = state.config.analysis;
    let cfg = AnalysisConfig {
        entry_threshold: req.entry_threshold.unwrap_or(defaults.entry_threshold),
        exit_threshold: req.exit_threshold.unwrap_or(defaults.exit_threshold),
        ..defaults
    };
    for (name, value) in [
        ("entry_threshold", cfg.entry_threshold),
        ("exit_threshold", cfg.exit_threshold),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(invalid(&format!("{name} must be a non-negative number")));
        }
    }
    Ok(cfg)
}

/// Both histories or neither; either failure aborts the request.
async fn fetch_pair(state: &AppState, pair: &PairQuery) -> AnalysisResult<(PriceSeries, PriceSeries)> {
    tracing::info!(period = %pair.period, "fetching pair");
    let (s1, s2) = tokio::try_join!(
        state.source.fetch(&pair.stock1, &pair.period),
        state.source.fetch(&pair.stock2, &pair.period),
    )?;
    state.counters.series_fetched.fetch_add(2, portable_atomic::Ordering::Relaxed);
    Ok((s1, s2))
}

#[inline]
fn invalid(msg: &str) -> ApiError {
    AnalysisError::InvalidInput(msg.to_string()).into()
}
