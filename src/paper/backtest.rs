use crate::config::AnalysisConfig;
use crate::errors::AnalysisResult;
use crate::models::cointegration::{self, CointegrationResult};
use crate::paper::performance::{self, PerformanceResult};
use crate::series::PriceSeries;
use crate::strategy::signals;

pub const NOT_COINTEGRATED: &str = "Stocks not cointegrated";

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BacktestReport {
    pub cointegration_results: CointegrationResult,
    pub performance_metrics: PerformanceResult,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub profit_loss: f64,
    /// Dates on which the strategy opened or closed a position.
    pub signals_count: usize,
}

/// Either a completed backtest or an explicit refusal to trade the pair.
/// Serialized untagged: a refusal is recognizable by its `error` field.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum BacktestResult {
    Completed(Box<BacktestReport>),
    NotCointegrated {
        error: &'static str,
        cointegration_results: CointegrationResult,
    },
}

impl BacktestResult {
    #[inline]
    pub fn is_completed(&self) -> bool {
        matches!(self, BacktestResult::Completed(_))
    }
}

/// Full pipeline with default significance and thresholds.
pub fn run_backtest(
    series1: &PriceSeries,
    series2: &PriceSeries,
    initial_capital: f64,
) -> AnalysisResult<BacktestResult> {
    run_backtest_with(series1, series2, initial_capital, AnalysisConfig::default())
}

/// cointegration test -> spread -> signals -> performance.
/// A pair that fails the cointegration gate is not traded.
pub fn run_backtest_with(
    series1: &PriceSeries,
    series2: &PriceSeries,
    initial_capital: f64,
    cfg: AnalysisConfig,
) -> AnalysisResult<BacktestResult> {
    let coint = cointegration::test_cointegration(series1, series2, cfg.significance)?;

    if !coint.is_cointegrated {
        tracing::info!(
            p_value = coint.p_value,
            "pair not cointegrated, backtest skipped"
        );
        return Ok(BacktestResult::NotCointegrated {
            error: NOT_COINTEGRATED,
            cointegration_results: coint,
        });
    }

    let spread = cointegration::calculate_spread(series1, series2, coint.beta)?;
    let signals = signals::generate_signals(&spread, cfg.thresholds());
    let perf = performance::calculate_performance(series1, series2, &signals, coint.beta)?;

    let final_capital = initial_capital * (1.0 + perf.total_return);
    let report = BacktestReport {
        signals_count: signals.iter().filter(|s| s.signal != 0).count(),
        cointegration_results: coint,
        performance_metrics: perf,
        initial_capital,
        final_capital,
        profit_loss: final_capital - initial_capital,
    };

    tracing::info!(
        initial = report.initial_capital,
        final_capital = report.final_capital,
        pnl = report.profit_loss,
        signals = report.signals_count,
        "backtest complete"
    );

    Ok(BacktestResult::Completed(Box::new(report)))
}
